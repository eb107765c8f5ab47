//! Reference records owned by other parts of the school system.
//!
//! The timetable engine only reads these: classes, subjects and teachers are
//! joined into projections, and teaching requirements drive the allocator.

use serde::{Deserialize, Serialize};

use super::ids::{ClassId, CohortYearId, SubjectId, TeacherId};
use super::level::EducationLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    pub id: ClassId,
    pub name: String,
    pub level: EducationLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub first_name: String,
    pub last_name: String,
}

impl Teacher {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A (teacher, subject, class, weekly hours) obligation for one cohort-year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingRequirement {
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
    pub cohort_year_id: CohortYearId,
    pub weekly_hours_needed: u32,
}
