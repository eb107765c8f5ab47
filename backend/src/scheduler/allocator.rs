//! Greedy slot allocation for one class.
//!
//! The allocator is a pure function of the requirements, the time grid and the
//! teacher commitments already made for the cohort-year. It walks days in
//! ascending order, then the teaching slots of each day in grid order, and
//! gives each requirement the first free slots whose teacher is available.
//! Requirements are served in catalog order. There is no backtracking: a
//! requirement processed early may take a slot a later one needed.

use chrono::NaiveTime;
use log::debug;
use std::collections::{HashMap, HashSet};

use crate::models::{
    ClassId, CohortYearId, EntryType, NewScheduleEntry, ScheduleEntry, ScheduleEntryId, SubjectId,
    TeacherId, TeachingRequirement, TimeGrid, TimeSlot,
};

/// `(day_index, start)` key of a weekly slot.
pub type SlotKey = (u8, NaiveTime);

/// Slots already taken by one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedSlots(HashSet<SlotKey>);

impl UsedSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &SlotKey) -> bool {
        self.0.contains(key)
    }

    /// Returns `false` if the slot was already taken.
    pub fn mark(&mut self, key: SlotKey) -> bool {
        self.0.insert(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A teacher's presence in some class at some slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    /// `None` for entries allocated in this run and not persisted yet.
    pub entry_id: Option<ScheduleEntryId>,
}

/// Index of where every teacher already teaches within one cohort-year.
///
/// This is the single availability predicate shared by generation and manual
/// edits: a teacher is busy at a slot when they are committed there to a
/// class other than the one being scheduled.
#[derive(Debug, Clone, Default)]
pub struct TeacherCommitments {
    by_slot: HashMap<(TeacherId, SlotKey), Vec<Commitment>>,
}

impl TeacherCommitments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ScheduleEntry>) -> Self {
        let mut commitments = Self::new();
        for entry in entries {
            if let Some(teacher_id) = entry.teacher_id {
                commitments.record(
                    teacher_id,
                    entry.slot_key(),
                    Commitment {
                        class_id: entry.class_id,
                        subject_id: entry.subject_id,
                        entry_id: Some(entry.id),
                    },
                );
            }
        }
        commitments
    }

    pub fn record(&mut self, teacher_id: TeacherId, slot: SlotKey, commitment: Commitment) {
        self.by_slot
            .entry((teacher_id, slot))
            .or_default()
            .push(commitment);
    }

    /// First commitment of `teacher_id` at `slot` in a class other than
    /// `class_id`, if any.
    pub fn conflicting(
        &self,
        teacher_id: TeacherId,
        slot: SlotKey,
        class_id: ClassId,
    ) -> Option<&Commitment> {
        self.by_slot
            .get(&(teacher_id, slot))
            .and_then(|list| list.iter().find(|c| c.class_id != class_id))
    }

    pub fn is_available(&self, teacher_id: TeacherId, slot: SlotKey, class_id: ClassId) -> bool {
        self.conflicting(teacher_id, slot, class_id).is_none()
    }

    /// Drop every commitment of `class_id` and record `entries` in its place.
    pub fn replace_class(&mut self, class_id: ClassId, entries: &[NewScheduleEntry]) {
        self.by_slot.retain(|_, list| {
            list.retain(|c| c.class_id != class_id);
            !list.is_empty()
        });
        for entry in entries {
            if let Some(teacher_id) = entry.teacher_id {
                self.record(
                    teacher_id,
                    entry.slot_key(),
                    Commitment {
                        class_id,
                        subject_id: entry.subject_id,
                        entry_id: None,
                    },
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_slot.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slot.is_empty()
    }
}

/// Non-fatal allocation failure, expressed with identifiers only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationConflict {
    /// The teacher is committed to another class at this slot; the slot was
    /// skipped for this requirement.
    TeacherUnavailable {
        teacher_id: TeacherId,
        subject_id: SubjectId,
        slot: TimeSlot,
        occupied_by: ClassId,
    },
    /// The grid ran out before the weekly hours were met.
    InsufficientSlots {
        teacher_id: TeacherId,
        subject_id: SubjectId,
        needed: u32,
        assigned: u32,
    },
}

/// Fixed parameters of one class's allocation.
#[derive(Debug, Clone, Copy)]
pub struct ClassContext<'a> {
    pub class_id: ClassId,
    pub cohort_year_id: CohortYearId,
    pub grid: &'a TimeGrid,
    pub room: &'a str,
}

impl ClassContext<'_> {
    fn entry_for(&self, requirement: &TeachingRequirement, slot: &TimeSlot) -> NewScheduleEntry {
        NewScheduleEntry {
            class_id: self.class_id,
            subject_id: requirement.subject_id,
            teacher_id: Some(requirement.teacher_id),
            cohort_year_id: self.cohort_year_id,
            day_index: slot.day_index,
            day_name: self
                .grid
                .day_name(slot.day_index)
                .unwrap_or_default()
                .to_string(),
            start: slot.start,
            end: slot.end,
            room: self.room.to_string(),
            entry_type: EntryType::Teaching,
        }
    }
}

/// Result of placing a single requirement.
#[derive(Debug, Clone)]
pub struct RequirementOutcome {
    pub used_slots: UsedSlots,
    pub entries: Vec<NewScheduleEntry>,
    pub conflicts: Vec<AllocationConflict>,
}

/// Result of allocating a whole class.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub entries: Vec<NewScheduleEntry>,
    pub conflicts: Vec<AllocationConflict>,
    pub used_slots: UsedSlots,
}

impl Allocation {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Place one requirement, starting from the class's current `used_slots`.
pub fn allocate_requirement(
    ctx: &ClassContext<'_>,
    requirement: &TeachingRequirement,
    mut used_slots: UsedSlots,
    commitments: &TeacherCommitments,
) -> RequirementOutcome {
    let needed = requirement.weekly_hours_needed;
    let mut assigned = 0u32;
    let mut entries = Vec::new();
    let mut conflicts = Vec::new();

    for slot in ctx.grid.teaching_slots() {
        if assigned >= needed {
            break;
        }
        let key = (slot.day_index, slot.start);
        if used_slots.contains(&key) {
            continue;
        }
        if let Some(busy) = commitments.conflicting(requirement.teacher_id, key, ctx.class_id) {
            debug!(
                "teacher {} busy with class {} on day {} at {}",
                requirement.teacher_id, busy.class_id, slot.day_index, slot.start
            );
            conflicts.push(AllocationConflict::TeacherUnavailable {
                teacher_id: requirement.teacher_id,
                subject_id: requirement.subject_id,
                slot,
                occupied_by: busy.class_id,
            });
            continue;
        }

        entries.push(ctx.entry_for(requirement, &slot));
        used_slots.mark(key);
        assigned += 1;
    }

    if assigned < needed {
        conflicts.push(AllocationConflict::InsufficientSlots {
            teacher_id: requirement.teacher_id,
            subject_id: requirement.subject_id,
            needed,
            assigned,
        });
    }

    RequirementOutcome {
        used_slots,
        entries,
        conflicts,
    }
}

/// Allocate every requirement of one class in catalog order.
///
/// Requirements for another class or cohort-year are ignored. `commitments`
/// must describe the cohort-year's other classes; commitments of this class
/// never block it.
pub fn allocate_class(
    ctx: &ClassContext<'_>,
    requirements: &[TeachingRequirement],
    commitments: &TeacherCommitments,
) -> Allocation {
    requirements
        .iter()
        .filter(|r| r.class_id == ctx.class_id && r.cohort_year_id == ctx.cohort_year_id)
        .fold(Allocation::default(), |mut acc, requirement| {
            let outcome = allocate_requirement(ctx, requirement, acc.used_slots, commitments);
            acc.used_slots = outcome.used_slots;
            acc.entries.extend(outcome.entries);
            acc.conflicts.extend(outcome.conflicts);
            acc
        })
}

/// Allocate several classes in the given order, each seeing the teachers
/// taken by the classes before it.
///
/// Returns one allocation per class and the commitments after the last one.
pub fn allocate_classes(
    cohort_year_id: CohortYearId,
    classes: &[(ClassId, Vec<TeachingRequirement>)],
    grid: &TimeGrid,
    room: &str,
    mut commitments: TeacherCommitments,
) -> (Vec<(ClassId, Allocation)>, TeacherCommitments) {
    let mut results = Vec::with_capacity(classes.len());
    for (class_id, requirements) in classes {
        let ctx = ClassContext {
            class_id: *class_id,
            cohort_year_id,
            grid,
            room,
        };
        let allocation = allocate_class(&ctx, requirements, &commitments);
        commitments.replace_class(*class_id, &allocation.entries);
        results.push((*class_id, allocation));
    }
    (results, commitments)
}
