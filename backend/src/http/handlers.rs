//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`ScheduleService`](crate::services::ScheduleService). Extractor failures
//! are turned into `400 BAD_REQUEST` bodies instead of axum's plain-text
//! rejections.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::dto::{
    parse_level, ClassTimetable, CohortQuery, EntryPatch, GenerateScheduleRequest,
    GenerationOutcome, HealthResponse, LevelQuery, ListSchedulesQuery, RetireCohortYearResponse,
    ScheduleListResponse, TeacherTimetable, TimeGridView,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{ClassId, CohortYearId, ScheduleEntry, ScheduleEntryId, TeacherId};
use crate::services::GenerateRequest;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.service.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Queries
// =============================================================================

/// GET /v1/schedules?level=&cohortYearId=&classId=&teacherId=
pub async fn list_schedules(
    State(state): State<AppState>,
    query: Result<Query<ListSchedulesQuery>, QueryRejection>,
) -> HandlerResult<ScheduleListResponse> {
    let Query(query) = query?;
    let level = parse_level(query.level.as_deref())?;
    let entries = state.service.list_entries(level, query.filter()).await?;
    let total = entries.len();

    Ok(Json(ScheduleListResponse { entries, total }))
}

/// GET /v1/schedules/time-grid
pub async fn get_time_grid(State(state): State<AppState>) -> HandlerResult<TimeGridView> {
    Ok(Json(state.service.time_grid_view()))
}

/// GET /v1/schedules/class/{class_id}?cohortYearId=
pub async fn get_class_schedule(
    State(state): State<AppState>,
    class_id: Result<Path<ClassId>, PathRejection>,
    query: Result<Query<CohortQuery>, QueryRejection>,
) -> HandlerResult<ClassTimetable> {
    let Path(class_id) = class_id?;
    let Query(query) = query?;
    let timetable = state
        .service
        .class_timetable(class_id, query.cohort_year_id)
        .await?;
    Ok(Json(timetable))
}

/// GET /v1/schedules/teacher/{teacher_id}?cohortYearId=
pub async fn get_teacher_schedule(
    State(state): State<AppState>,
    teacher_id: Result<Path<TeacherId>, PathRejection>,
    query: Result<Query<CohortQuery>, QueryRejection>,
) -> HandlerResult<TeacherTimetable> {
    let Path(teacher_id) = teacher_id?;
    let Query(query) = query?;
    let timetable = state
        .service
        .teacher_timetable(teacher_id, query.cohort_year_id)
        .await?;
    Ok(Json(timetable))
}

/// GET /v1/schedules/{id}?level=
///
/// Without `level`, the partitions are probed in order.
pub async fn get_schedule(
    State(state): State<AppState>,
    id: Result<Path<ScheduleEntryId>, PathRejection>,
    query: Result<Query<LevelQuery>, QueryRejection>,
) -> HandlerResult<ScheduleEntry> {
    let Path(id) = id?;
    let Query(query) = query?;
    let level = parse_level(query.level.as_deref())?;
    Ok(Json(state.service.get_entry(level, id).await?))
}

// =============================================================================
// Generation and edits
// =============================================================================

/// POST /v1/schedules/generate
///
/// Body: `{ level, classIds?, options?: { cohortYearId?, defaultRoom? } }`.
pub async fn generate_schedules(
    State(state): State<AppState>,
    body: Result<Json<GenerateScheduleRequest>, JsonRejection>,
) -> HandlerResult<GenerationOutcome> {
    let Json(body) = body?;
    let request = GenerateRequest::try_from(body)?;
    Ok(Json(state.service.generate(request).await?))
}

/// PUT /v1/schedules/{id}?level=
///
/// Body: any subset of `{ dayIndex, start, end, room, teacherId }`.
/// Returns 409 with the colliding commitment when the edit is rejected.
pub async fn update_schedule(
    State(state): State<AppState>,
    id: Result<Path<ScheduleEntryId>, PathRejection>,
    query: Result<Query<LevelQuery>, QueryRejection>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> HandlerResult<ScheduleEntry> {
    let Path(id) = id?;
    let Query(query) = query?;
    let Json(patch) = body?;
    let level = parse_level(query.level.as_deref())?;
    Ok(Json(state.service.update_entry(level, id, patch).await?))
}

/// DELETE /v1/schedules/{id}?level=
pub async fn delete_schedule(
    State(state): State<AppState>,
    id: Result<Path<ScheduleEntryId>, PathRejection>,
    query: Result<Query<LevelQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    let Query(query) = query?;
    let level = parse_level(query.level.as_deref())?;
    state.service.delete_entry(level, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/schedules/cohort-years/{cohort_year_id}
pub async fn retire_cohort_year(
    State(state): State<AppState>,
    cohort_year_id: Result<Path<CohortYearId>, PathRejection>,
) -> HandlerResult<RetireCohortYearResponse> {
    let Path(cohort_year_id) = cohort_year_id?;
    let removed = state.service.retire_cohort_year(cohort_year_id).await?;
    Ok(Json(RetireCohortYearResponse {
        cohort_year_id,
        removed,
    }))
}
