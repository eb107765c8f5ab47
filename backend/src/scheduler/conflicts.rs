//! Conflict reporting for generation runs.
//!
//! The allocator speaks in identifiers; this module turns its conflicts into
//! the records returned to callers, with names resolved through a
//! [`NameLookup`], and groups them by class.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::allocator::AllocationConflict;
use crate::models::{
    hhmm, ClassId, SchoolClass, Subject, SubjectId, Teacher, TeacherId, TimeGrid,
};

/// A non-fatal allocation shortfall, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ConflictRecord {
    TeacherConflict {
        class_id: ClassId,
        day_index: u8,
        day_name: String,
        #[serde(with = "hhmm")]
        start: NaiveTime,
        #[serde(with = "hhmm")]
        end: NaiveTime,
        teacher_id: TeacherId,
        teacher_name: Option<String>,
        subject_id: SubjectId,
        subject_name: Option<String>,
        occupied_by_class_id: ClassId,
        occupied_by_class_name: Option<String>,
    },
    InsufficientSlots {
        class_id: ClassId,
        subject_id: SubjectId,
        subject_name: Option<String>,
        teacher_id: TeacherId,
        teacher_name: Option<String>,
        needed: u32,
        assigned: u32,
    },
}

impl ConflictRecord {
    pub fn class_id(&self) -> ClassId {
        match self {
            ConflictRecord::TeacherConflict { class_id, .. }
            | ConflictRecord::InsufficientSlots { class_id, .. } => *class_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConflictRecord::TeacherConflict { .. } => "teacher_conflict",
            ConflictRecord::InsufficientSlots { .. } => "insufficient_slots",
        }
    }

    /// Build the record for a conflict raised while allocating `class_id`.
    pub fn from_allocation(
        class_id: ClassId,
        conflict: &AllocationConflict,
        grid: &TimeGrid,
        names: &dyn NameLookup,
    ) -> Self {
        match conflict {
            AllocationConflict::TeacherUnavailable {
                teacher_id,
                subject_id,
                slot,
                occupied_by,
            } => ConflictRecord::TeacherConflict {
                class_id,
                day_index: slot.day_index,
                day_name: grid.day_name(slot.day_index).unwrap_or_default().to_string(),
                start: slot.start,
                end: slot.end,
                teacher_id: *teacher_id,
                teacher_name: names.teacher_name(*teacher_id),
                subject_id: *subject_id,
                subject_name: names.subject_name(*subject_id),
                occupied_by_class_id: *occupied_by,
                occupied_by_class_name: names.class_name(*occupied_by),
            },
            AllocationConflict::InsufficientSlots {
                teacher_id,
                subject_id,
                needed,
                assigned,
            } => ConflictRecord::InsufficientSlots {
                class_id,
                subject_id: *subject_id,
                subject_name: names.subject_name(*subject_id),
                teacher_id: *teacher_id,
                teacher_name: names.teacher_name(*teacher_id),
                needed: *needed,
                assigned: *assigned,
            },
        }
    }
}

/// Resolves display names for conflict records. Unknown ids yield `None`.
pub trait NameLookup {
    fn class_name(&self, id: ClassId) -> Option<String>;
    fn subject_name(&self, id: SubjectId) -> Option<String>;
    fn teacher_name(&self, id: TeacherId) -> Option<String>;
}

/// Reference records fetched for one request, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    classes: HashMap<ClassId, SchoolClass>,
    subjects: HashMap<SubjectId, Subject>,
    teachers: HashMap<TeacherId, Teacher>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: SchoolClass) {
        self.classes.insert(class.id, class);
    }

    pub fn add_subject(&mut self, subject: Subject) {
        self.subjects.insert(subject.id, subject);
    }

    pub fn add_teacher(&mut self, teacher: Teacher) {
        self.teachers.insert(teacher.id, teacher);
    }

    pub fn class(&self, id: ClassId) -> Option<&SchoolClass> {
        self.classes.get(&id)
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    pub fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.get(&id)
    }
}

impl NameLookup for ReferenceIndex {
    fn class_name(&self, id: ClassId) -> Option<String> {
        self.class(id).map(|c| c.name.clone())
    }

    fn subject_name(&self, id: SubjectId) -> Option<String> {
        self.subject(id).map(|s| s.name.clone())
    }

    fn teacher_name(&self, id: TeacherId) -> Option<String> {
        self.teacher(id).map(Teacher::display_name)
    }
}

/// Outcome of a generation run: entries created and conflicts per class.
///
/// Only classes that produced at least one conflict appear in `by_class`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub generated_count: usize,
    pub by_class: BTreeMap<ClassId, Vec<ConflictRecord>>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one class's allocation.
    pub fn record_class(
        &mut self,
        class_id: ClassId,
        generated: usize,
        conflicts: &[AllocationConflict],
        grid: &TimeGrid,
        names: &dyn NameLookup,
    ) {
        self.generated_count += generated;
        if conflicts.is_empty() {
            return;
        }
        let records = self.by_class.entry(class_id).or_default();
        records.extend(
            conflicts
                .iter()
                .map(|c| ConflictRecord::from_allocation(class_id, c, grid, names)),
        );
    }

    pub fn conflict_count(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn for_class(&self, class_id: ClassId) -> &[ConflictRecord] {
        self.by_class
            .get(&class_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
