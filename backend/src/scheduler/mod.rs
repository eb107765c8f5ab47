//! Timetable generation core.
//!
//! Everything here is synchronous and free of I/O: the allocator takes the
//! requirement catalog, the time grid and the teacher commitments already in
//! the store, and returns entries plus conflicts. Persistence, locking and
//! name resolution live in `services`.

pub mod allocator;
pub mod conflicts;

pub use allocator::{
    allocate_class, allocate_classes, allocate_requirement, Allocation, AllocationConflict,
    ClassContext, Commitment, RequirementOutcome, SlotKey, TeacherCommitments, UsedSlots,
};
pub use conflicts::{ConflictRecord, ConflictReport, NameLookup, ReferenceIndex};
