//! Data Transfer Objects for the HTTP API.
//!
//! Entries, timetables and generation outcomes already serialize in their
//! wire shape and are returned as is; this module holds the request and
//! envelope types that exist only at the HTTP boundary.

use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::models::{
    ClassId, CohortYearId, EducationLevel, EntryFilter, ScheduleEntry, TeacherId,
};
use crate::services::{GenerateOptions, GenerateRequest};

pub use crate::models::EntryPatch;
pub use crate::services::{ClassTimetable, GenerationOutcome, TeacherTimetable, TimeGridView};

/// Parse an optional `level` parameter.
pub fn parse_level(raw: Option<&str>) -> Result<Option<EducationLevel>, AppError> {
    raw.map(|s| s.parse::<EducationLevel>().map_err(AppError::BadRequest))
        .transpose()
}

/// Query for `GET /v1/schedules`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSchedulesQuery {
    pub level: Option<String>,
    pub cohort_year_id: Option<CohortYearId>,
    pub class_id: Option<ClassId>,
    pub teacher_id: Option<TeacherId>,
}

impl ListSchedulesQuery {
    pub fn filter(&self) -> EntryFilter {
        EntryFilter {
            cohort_year_id: self.cohort_year_id,
            class_id: self.class_id,
            teacher_id: self.teacher_id,
        }
    }
}

/// Optional partition qualifier for single-entry routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelQuery {
    pub level: Option<String>,
}

/// Optional cohort-year for the projection routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortQuery {
    pub cohort_year_id: Option<CohortYearId>,
}

/// Body of `POST /v1/schedules/generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleRequest {
    pub level: Option<String>,
    #[serde(default)]
    pub class_ids: Option<Vec<ClassId>>,
    #[serde(default)]
    pub options: Option<GenerateOptions>,
}

impl TryFrom<GenerateScheduleRequest> for GenerateRequest {
    type Error = AppError;

    fn try_from(body: GenerateScheduleRequest) -> Result<Self, Self::Error> {
        let level = parse_level(body.level.as_deref())?
            .ok_or_else(|| AppError::BadRequest("level is required".to_string()))?;
        Ok(GenerateRequest {
            level,
            class_ids: body.class_ids,
            options: body.options.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleListResponse {
    pub entries: Vec<ScheduleEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetireCohortYearResponse {
    pub cohort_year_id: CohortYearId,
    pub removed: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}
