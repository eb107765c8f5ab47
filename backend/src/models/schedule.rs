//! Schedule entries: the persisted unit of a timetable.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ids::{ClassId, CohortYearId, ScheduleEntryId, SubjectId, TeacherId};
use super::time_grid::hhmm;

/// Kind of session an entry represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Teaching,
    Practical,
    Tutorial,
    Assessment,
}

/// A stored timetable slot for one class.
///
/// `(class_id, cohort_year_id, day_index, start)` is unique within a
/// partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: ScheduleEntryId,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: Option<TeacherId>,
    pub cohort_year_id: CohortYearId,
    pub day_index: u8,
    pub day_name: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub room: String,
    pub entry_type: EntryType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleEntry {
    pub fn slot_key(&self) -> (u8, NaiveTime) {
        (self.day_index, self.start)
    }
}

/// An entry not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduleEntry {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: Option<TeacherId>,
    pub cohort_year_id: CohortYearId,
    pub day_index: u8,
    pub day_name: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub room: String,
    pub entry_type: EntryType,
}

impl NewScheduleEntry {
    pub fn slot_key(&self) -> (u8, NaiveTime) {
        (self.day_index, self.start)
    }
}

/// Optional filters for listing entries. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFilter {
    pub cohort_year_id: Option<CohortYearId>,
    pub class_id: Option<ClassId>,
    pub teacher_id: Option<TeacherId>,
}

impl EntryFilter {
    pub fn for_cohort(cohort_year_id: CohortYearId) -> Self {
        Self {
            cohort_year_id: Some(cohort_year_id),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class_id: ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn with_teacher(mut self, teacher_id: TeacherId) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }

    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        self.cohort_year_id.map_or(true, |c| entry.cohort_year_id == c)
            && self.class_id.map_or(true, |c| entry.class_id == c)
            && self.teacher_id.map_or(true, |t| entry.teacher_id == Some(t))
    }
}

/// Manual edit of a single entry. Absent fields keep their current value;
/// `teacherId: null` clears the teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default)]
    pub day_index: Option<u8>,
    #[serde(default, with = "hhmm::option")]
    pub start: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end: Option<NaiveTime>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default, deserialize_with = "present_value")]
    pub teacher_id: Option<Option<TeacherId>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.day_index.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.room.is_none()
            && self.teacher_id.is_none()
    }
}

// Distinguishes an explicit `null` from an absent field.
fn present_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
