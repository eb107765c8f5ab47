//! Errors raised by the schedule service.

use chrono::NaiveTime;
use serde::Serialize;
use std::fmt;

use crate::db::RepositoryError;
use crate::models::{hhmm, ClassId, ScheduleEntryId, SubjectId, TeacherId};

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or inconsistent input; nothing was changed.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// A manual edit collides with an existing commitment; the entry is left
    /// unchanged.
    #[error("{0}")]
    Conflict(EditConflict),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Turn a repository `NotFound` into a service `NotFound` carrying
    /// `message`; other errors pass through.
    pub fn missing(err: RepositoryError, message: impl Into<String>) -> Self {
        if err.is_not_found() {
            Self::NotFound(message.into())
        } else {
            Self::Repository(err)
        }
    }
}

/// Why a manual edit was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EditConflict {
    /// The teacher already teaches another class at the target slot.
    TeacherConflict {
        entry_id: ScheduleEntryId,
        teacher_id: TeacherId,
        teacher_name: Option<String>,
        day_index: u8,
        day_name: String,
        #[serde(with = "hhmm")]
        start: NaiveTime,
        conflicting_entry_id: Option<ScheduleEntryId>,
        conflicting_class_id: ClassId,
        conflicting_class_name: Option<String>,
        conflicting_subject_id: SubjectId,
        conflicting_subject_name: Option<String>,
    },
    /// The class already has another entry at the target slot.
    SlotOccupied {
        entry_id: ScheduleEntryId,
        class_id: ClassId,
        day_index: u8,
        day_name: String,
        #[serde(with = "hhmm")]
        start: NaiveTime,
        occupied_by_entry_id: Option<ScheduleEntryId>,
    },
}

impl fmt::Display for EditConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditConflict::TeacherConflict {
                teacher_id,
                teacher_name,
                day_name,
                start,
                conflicting_class_id,
                conflicting_class_name,
                conflicting_subject_name,
                ..
            } => {
                let teacher = teacher_name
                    .clone()
                    .unwrap_or_else(|| format!("teacher {}", teacher_id));
                let class = conflicting_class_name
                    .clone()
                    .unwrap_or_else(|| format!("class {}", conflicting_class_id));
                write!(
                    f,
                    "{} already teaches {} on {} at {}",
                    teacher,
                    class,
                    day_name,
                    hhmm::format(start)
                )?;
                if let Some(subject) = conflicting_subject_name {
                    write!(f, " ({})", subject)?;
                }
                Ok(())
            }
            EditConflict::SlotOccupied {
                class_id,
                day_name,
                start,
                ..
            } => write!(
                f,
                "class {} already has an entry on {} at {}",
                class_id,
                day_name,
                hhmm::format(start)
            ),
        }
    }
}
