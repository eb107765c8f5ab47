//! Manual edits: single-entry update and delete, and cohort-year retirement.
//!
//! An update is checked against the same teacher-availability predicate the
//! allocator uses, with the cohort-year lock held from the check until the
//! write. A rejected update leaves the entry untouched.

use chrono::NaiveTime;
use log::{debug, info};

use super::audit::{AuditAction, AuditEvent};
use super::error::{EditConflict, ServiceError, ServiceResult};
use super::schedule_service::ScheduleService;
use crate::db::RepositoryError;
use crate::models::{
    hhmm, CohortYearId, EducationLevel, EntryFilter, EntryPatch, ScheduleEntry, ScheduleEntryId,
    TeacherId,
};
use crate::scheduler::{NameLookup, TeacherCommitments};

/// Field values an update resolves to, new where supplied, old otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedEdit {
    day_index: u8,
    start: NaiveTime,
    end: NaiveTime,
    room: String,
    teacher_id: Option<TeacherId>,
}

impl ScheduleService {
    /// Apply a manual edit to one entry.
    ///
    /// Without `level`, the entry is looked up in every partition.
    pub async fn update_entry(
        &self,
        level: Option<EducationLevel>,
        id: ScheduleEntryId,
        patch: EntryPatch,
    ) -> ServiceResult<ScheduleEntry> {
        if patch.is_empty() {
            return Err(ServiceError::validation("Update contains no fields"));
        }
        if let Some(day) = patch.day_index {
            if !self.grid.has_day(day) {
                return Err(ServiceError::validation(format!(
                    "Day index {} is not part of the time grid",
                    day
                )));
            }
        }
        if let Some(Some(teacher_id)) = patch.teacher_id {
            self.repo.get_teacher(teacher_id).await.map_err(|e| {
                if e.is_not_found() {
                    ServiceError::validation(format!("Unknown teacher {}", teacher_id))
                } else {
                    e.into()
                }
            })?;
        }

        let (level, located) = self.locate_entry(level, id).await?;
        let _guard = self.locks.acquire(located.cohort_year_id).await;
        // Re-read under the lock; another writer may have moved it.
        let current = self
            .repo
            .get_entry(level, id)
            .await
            .map_err(|e| ServiceError::missing(e, format!("Schedule entry {} not found", id)))?;

        let resolved = resolve(&current, &patch)?;

        if let Some(conflict) = self.check_edit(level, &current, &resolved).await? {
            debug!("Rejected edit of entry {}: {}", id, conflict);
            return Err(ServiceError::Conflict(conflict));
        }

        let before = (current.day_index, current.start, current.teacher_id);
        let day_name = self
            .grid
            .day_name(resolved.day_index)
            .unwrap_or_default()
            .to_string();
        let updated = ScheduleEntry {
            day_index: resolved.day_index,
            day_name,
            start: resolved.start,
            end: resolved.end,
            room: resolved.room,
            teacher_id: resolved.teacher_id,
            ..current
        };

        let saved = match self.repo.update_entry(level, updated).await {
            Ok(saved) => saved,
            Err(RepositoryError::ConstraintViolation { .. }) => {
                return Err(ServiceError::Conflict(EditConflict::SlotOccupied {
                    entry_id: id,
                    class_id: located.class_id,
                    day_index: resolved.day_index,
                    day_name: self
                        .grid
                        .day_name(resolved.day_index)
                        .unwrap_or_default()
                        .to_string(),
                    start: resolved.start,
                    occupied_by_entry_id: None,
                }))
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Updated schedule entry {} ({}): day {} {} -> day {} {}",
            id,
            level,
            before.0,
            hhmm::format(&before.1),
            saved.day_index,
            hhmm::format(&saved.start)
        );
        self.emit(AuditEvent::new(
            AuditAction::EntryUpdated,
            level,
            saved.cohort_year_id,
            format!("schedule_entry:{}", id),
            serde_json::json!({
                "before": {
                    "dayIndex": before.0,
                    "start": hhmm::format(&before.1),
                    "teacherId": before.2,
                },
                "after": {
                    "dayIndex": saved.day_index,
                    "start": hhmm::format(&saved.start),
                    "end": hhmm::format(&saved.end),
                    "room": saved.room,
                    "teacherId": saved.teacher_id,
                },
            }),
        ));
        Ok(saved)
    }

    /// Remove one entry.
    pub async fn delete_entry(
        &self,
        level: Option<EducationLevel>,
        id: ScheduleEntryId,
    ) -> ServiceResult<()> {
        let (level, entry) = self.locate_entry(level, id).await?;
        let _guard = self.locks.acquire(entry.cohort_year_id).await;

        if !self.repo.delete_entry(level, id).await? {
            return Err(ServiceError::not_found(format!(
                "Schedule entry {} not found",
                id
            )));
        }

        info!("Deleted schedule entry {} ({})", id, level);
        self.emit(AuditEvent::new(
            AuditAction::EntryDeleted,
            level,
            entry.cohort_year_id,
            format!("schedule_entry:{}", id),
            serde_json::json!({
                "classId": entry.class_id,
                "dayIndex": entry.day_index,
                "start": hhmm::format(&entry.start),
            }),
        ));
        Ok(())
    }

    /// Delete every entry of a cohort-year. Returns the number removed.
    pub async fn retire_cohort_year(&self, cohort_year_id: CohortYearId) -> ServiceResult<usize> {
        let cohort = self.cohort_year(cohort_year_id).await?;
        let _guard = self.locks.acquire(cohort.id).await;

        let removed = self.repo.delete_cohort_year(cohort.level, cohort.id).await?;
        info!(
            "Retired cohort year {} ({}): {} entries removed",
            cohort.label, cohort.id, removed
        );
        self.emit(AuditEvent::new(
            AuditAction::CohortYearRetired,
            cohort.level,
            cohort.id,
            format!("cohort_year:{}", cohort.id),
            serde_json::json!({ "removed": removed }),
        ));
        Ok(removed)
    }

    /// Find what, if anything, blocks `current` from moving to `resolved`.
    async fn check_edit(
        &self,
        level: EducationLevel,
        current: &ScheduleEntry,
        resolved: &ResolvedEdit,
    ) -> ServiceResult<Option<EditConflict>> {
        let slot = (resolved.day_index, resolved.start);
        let day_name = self
            .grid
            .day_name(resolved.day_index)
            .unwrap_or_default()
            .to_string();

        let class_entries = self
            .repo
            .list_entries(
                level,
                &EntryFilter::for_cohort(current.cohort_year_id).with_class(current.class_id),
            )
            .await?;
        if let Some(other) = class_entries
            .iter()
            .find(|e| e.id != current.id && e.slot_key() == slot)
        {
            return Ok(Some(EditConflict::SlotOccupied {
                entry_id: current.id,
                class_id: current.class_id,
                day_index: resolved.day_index,
                day_name,
                start: resolved.start,
                occupied_by_entry_id: Some(other.id),
            }));
        }

        let Some(teacher_id) = resolved.teacher_id else {
            return Ok(None);
        };
        let teacher_entries = self
            .repo
            .list_entries(
                level,
                &EntryFilter::for_cohort(current.cohort_year_id).with_teacher(teacher_id),
            )
            .await?;
        let commitments =
            TeacherCommitments::from_entries(teacher_entries.iter().filter(|e| e.id != current.id));
        let Some(busy) = commitments.conflicting(teacher_id, slot, current.class_id).copied() else {
            return Ok(None);
        };

        let names = self
            .load_references(
                [busy.class_id].into_iter().collect(),
                [busy.subject_id].into_iter().collect(),
                [teacher_id].into_iter().collect(),
            )
            .await?;
        Ok(Some(EditConflict::TeacherConflict {
            entry_id: current.id,
            teacher_id,
            teacher_name: names.teacher_name(teacher_id),
            day_index: resolved.day_index,
            day_name,
            start: resolved.start,
            conflicting_entry_id: busy.entry_id,
            conflicting_class_id: busy.class_id,
            conflicting_class_name: names.class_name(busy.class_id),
            conflicting_subject_id: busy.subject_id,
            conflicting_subject_name: names.subject_name(busy.subject_id),
        }))
    }
}

/// Merge a patch over the current entry.
///
/// Moving `start` without an explicit `end` keeps the entry's duration.
fn resolve(current: &ScheduleEntry, patch: &EntryPatch) -> ServiceResult<ResolvedEdit> {
    if let Some(time) = patch
        .start
        .iter()
        .chain(patch.end.iter())
        .find(|t| !hhmm::is_whole_minute(t))
    {
        return Err(ServiceError::validation(format!(
            "Time {} must fall on a whole minute",
            time
        )));
    }

    let start = patch.start.unwrap_or(current.start);
    let end = match patch.end {
        Some(end) => end,
        None if start != current.start => {
            let (end, wrapped) = start.overflowing_add_signed(current.end - current.start);
            if wrapped != 0 {
                return Err(ServiceError::validation(format!(
                    "Entry moved to {} would end after midnight",
                    hhmm::format(&start)
                )));
            }
            end
        }
        None => current.end,
    };
    if end <= start {
        return Err(ServiceError::validation(format!(
            "End {} must be after start {}",
            hhmm::format(&end),
            hhmm::format(&start)
        )));
    }

    Ok(ResolvedEdit {
        day_index: patch.day_index.unwrap_or(current.day_index),
        start,
        end,
        room: patch.room.clone().unwrap_or_else(|| current.room.clone()),
        teacher_id: patch.teacher_id.unwrap_or(current.teacher_id),
    })
}
