//! The schedule service: entry point for generation, edits and read views.
//!
//! The impl is split by concern:
//! - `generation.rs`: slot allocation runs
//! - `mutation.rs`: validated single-entry edits, deletion, retirement
//! - `projections.rs`: list, lookup and joined views

use log::warn;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use super::audit::{AuditEvent, AuditSink, LogAuditSink};
use super::error::{ServiceError, ServiceResult};
use super::locks::CohortLocks;
use crate::db::FullRepository;
use crate::models::{
    ClassId, CohortYear, CohortYearId, EducationLevel, ScheduleEntry, ScheduleEntryId, SubjectId,
    TeacherId, TimeGrid,
};
use crate::scheduler::ReferenceIndex;

/// Tunables for generation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSettings {
    /// Room written on generated entries when the request names none.
    pub default_room: String,
    /// Overall budget for one run, checked between classes.
    pub max_duration: Option<Duration>,
}

#[derive(Clone)]
pub struct ScheduleService {
    pub(super) repo: Arc<dyn FullRepository>,
    pub(super) grid: Arc<TimeGrid>,
    pub(super) locks: CohortLocks,
    pub(super) audit: Arc<dyn AuditSink>,
    pub(super) settings: GenerationSettings,
}

impl ScheduleService {
    pub fn new(repo: Arc<dyn FullRepository>, grid: TimeGrid) -> Self {
        Self {
            repo,
            grid: Arc::new(grid),
            locks: CohortLocks::new(),
            audit: Arc::new(LogAuditSink),
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub async fn health_check(&self) -> ServiceResult<bool> {
        Ok(self.repo.health_check().await?)
    }

    pub(super) fn emit(&self, event: AuditEvent) {
        self.audit.emit(event);
    }

    /// Find an entry in `level`, or probe every partition in order when no
    /// level is given. Returns the partition it was found in.
    pub(super) async fn locate_entry(
        &self,
        level: Option<EducationLevel>,
        id: ScheduleEntryId,
    ) -> ServiceResult<(EducationLevel, ScheduleEntry)> {
        let candidates: &[EducationLevel] = match &level {
            Some(level) => std::slice::from_ref(level),
            None => &EducationLevel::ALL,
        };
        for &candidate in candidates {
            match self.repo.get_entry(candidate, id).await {
                Ok(entry) => return Ok((candidate, entry)),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::not_found(format!("Schedule entry {} not found", id)))
    }

    pub(super) async fn cohort_year(&self, id: CohortYearId) -> ServiceResult<CohortYear> {
        self.repo
            .get_cohort_year(id)
            .await
            .map_err(|e| ServiceError::missing(e, format!("Cohort year {} not found", id)))
    }

    /// Fetch the reference records behind a set of ids. Records that no
    /// longer exist are skipped with a warning so views still render.
    pub(super) async fn load_references(
        &self,
        classes: BTreeSet<ClassId>,
        subjects: BTreeSet<SubjectId>,
        teachers: BTreeSet<TeacherId>,
    ) -> ServiceResult<ReferenceIndex> {
        let mut index = ReferenceIndex::new();
        for id in classes {
            match self.repo.get_class(id).await {
                Ok(class) => index.add_class(class),
                Err(e) if e.is_not_found() => warn!("Class {} referenced but not found", id),
                Err(e) => return Err(e.into()),
            }
        }
        for id in subjects {
            match self.repo.get_subject(id).await {
                Ok(subject) => index.add_subject(subject),
                Err(e) if e.is_not_found() => warn!("Subject {} referenced but not found", id),
                Err(e) => return Err(e.into()),
            }
        }
        for id in teachers {
            match self.repo.get_teacher(id).await {
                Ok(teacher) => index.add_teacher(teacher),
                Err(e) if e.is_not_found() => warn!("Teacher {} referenced but not found", id),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(index)
    }

    /// Reference records for a batch of entries.
    pub(super) async fn references_for(
        &self,
        entries: &[ScheduleEntry],
    ) -> ServiceResult<ReferenceIndex> {
        self.load_references(
            entries.iter().map(|e| e.class_id).collect(),
            entries.iter().map(|e| e.subject_id).collect(),
            entries.iter().filter_map(|e| e.teacher_id).collect(),
        )
        .await
    }
}
