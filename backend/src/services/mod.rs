//! Service layer for business logic and orchestration.
//!
//! [`ScheduleService`] sits between the HTTP handlers and the repository. It
//! owns the time grid, serializes writers per cohort-year and emits audit
//! events; the allocation itself is delegated to [`crate::scheduler`].

pub mod audit;
pub mod error;
pub mod generation;
pub mod locks;
pub mod mutation;
pub mod projections;
pub mod schedule_service;

pub use audit::{AuditAction, AuditEvent, AuditSink, LogAuditSink, MemoryAuditSink};
pub use error::{EditConflict, ServiceError, ServiceResult};
pub use generation::{GenerateOptions, GenerateRequest, GenerationOutcome};
pub use locks::CohortLocks;
pub use projections::{
    ClassScheduleItem, ClassTimetable, DayView, TeacherScheduleItem, TeacherTimetable,
    TimeGridView,
};
pub use schedule_service::{GenerationSettings, ScheduleService};
