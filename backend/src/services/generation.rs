//! Generation runs: allocate every requested class of a cohort-year and
//! replace its stored entries.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use super::audit::{AuditAction, AuditEvent};
use super::error::{ServiceError, ServiceResult};
use super::schedule_service::ScheduleService;
use crate::models::{
    ClassId, CohortYear, CohortYearId, EducationLevel, EntryFilter, SchoolClass,
    TeachingRequirement,
};
use crate::scheduler::{
    allocate_class, AllocationConflict, ClassContext, ConflictRecord, ConflictReport,
    TeacherCommitments,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Cohort-year to generate for; defaults to the level's current one.
    #[serde(default)]
    pub cohort_year_id: Option<CohortYearId>,
    #[serde(default)]
    pub default_room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub level: EducationLevel,
    /// Classes to regenerate, in order. `None` means every class of the level.
    pub class_ids: Option<Vec<ClassId>>,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn for_level(level: EducationLevel) -> Self {
        Self {
            level,
            class_ids: None,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_classes(mut self, class_ids: impl IntoIterator<Item = ClassId>) -> Self {
        self.class_ids = Some(class_ids.into_iter().collect());
        self
    }

    pub fn with_cohort_year(mut self, cohort_year_id: CohortYearId) -> Self {
        self.options.cohort_year_id = Some(cohort_year_id);
        self
    }
}

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub generated_count: usize,
    pub cohort_year_id: CohortYearId,
    /// Only classes with at least one conflict appear here.
    pub conflicts_by_class: BTreeMap<ClassId, Vec<ConflictRecord>>,
    /// Classes left untouched because the run's time budget ran out.
    pub skipped_class_ids: Vec<ClassId>,
}

impl GenerationOutcome {
    pub fn conflict_count(&self) -> usize {
        self.conflicts_by_class.values().map(Vec::len).sum()
    }
}

impl ScheduleService {
    /// Regenerate the timetable of the requested classes.
    ///
    /// Each class's entries for the cohort-year are replaced wholesale.
    /// Classes are processed one after another, each seeing the teacher
    /// commitments of the classes before it. Conflicts never abort the run.
    pub async fn generate(&self, request: GenerateRequest) -> ServiceResult<GenerationOutcome> {
        let started = Instant::now();
        let level = request.level;
        let cohort = self
            .resolve_cohort(level, request.options.cohort_year_id)
            .await?;
        let classes = self
            .resolve_classes(level, request.class_ids.as_deref())
            .await?;
        let room = request
            .options
            .default_room
            .clone()
            .unwrap_or_else(|| self.settings.default_room.clone());

        let _guard = self.locks.acquire(cohort.id).await;

        let existing = self
            .repo
            .list_entries(level, &EntryFilter::for_cohort(cohort.id))
            .await?;
        let mut commitments = TeacherCommitments::from_entries(existing.iter());

        let mut plan: Vec<(SchoolClass, Vec<TeachingRequirement>)> =
            Vec::with_capacity(classes.len());
        for class in classes {
            let requirements = self.repo.list_requirements(cohort.id, class.id).await?;
            plan.push((class, requirements));
        }

        let names = self
            .load_references(
                existing
                    .iter()
                    .map(|e| e.class_id)
                    .chain(plan.iter().map(|(c, _)| c.id))
                    .collect(),
                plan.iter()
                    .flat_map(|(_, reqs)| reqs.iter().map(|r| r.subject_id))
                    .collect(),
                plan.iter()
                    .flat_map(|(_, reqs)| reqs.iter().map(|r| r.teacher_id))
                    .collect(),
            )
            .await?;

        let mut report = ConflictReport::new();
        let mut skipped = Vec::new();
        let mut generated_classes = Vec::new();

        for (class, requirements) in plan {
            if let Some(budget) = self.settings.max_duration {
                if started.elapsed() >= budget {
                    skipped.push(class.id);
                    continue;
                }
            }

            let ctx = ClassContext {
                class_id: class.id,
                cohort_year_id: cohort.id,
                grid: &self.grid,
                room: &room,
            };
            let allocation = allocate_class(&ctx, &requirements, &commitments);
            let stored = self
                .repo
                .replace_class_entries(level, cohort.id, class.id, allocation.entries.clone())
                .await?;
            commitments.replace_class(class.id, &allocation.entries);

            for conflict in &allocation.conflicts {
                if let AllocationConflict::InsufficientSlots {
                    subject_id,
                    needed,
                    assigned,
                    ..
                } = conflict
                {
                    warn!(
                        "Class {} ({}): subject {} got {} of {} weekly hours",
                        class.name, class.id, subject_id, assigned, needed
                    );
                }
            }
            info!(
                "Generated {} entries for class {} ({}) in cohort year {}, {} conflicts",
                stored.len(),
                class.name,
                class.id,
                cohort.id,
                allocation.conflicts.len()
            );

            report.record_class(
                class.id,
                stored.len(),
                &allocation.conflicts,
                &self.grid,
                &names,
            );
            generated_classes.push(class.id);
        }

        if !skipped.is_empty() {
            warn!(
                "Generation for cohort year {} ran out of time; {} classes skipped",
                cohort.id,
                skipped.len()
            );
        }
        info!(
            "Generation for {} cohort year {} done: {} classes, {} entries, {} conflicts in {:?}",
            level,
            cohort.id,
            generated_classes.len(),
            report.generated_count,
            report.conflict_count(),
            started.elapsed()
        );

        self.emit(AuditEvent::new(
            AuditAction::GenerationCompleted,
            level,
            cohort.id,
            format!(
                "class:{}",
                generated_classes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            serde_json::json!({
                "generatedCount": report.generated_count,
                "conflictCount": report.conflict_count(),
                "skippedClassIds": skipped,
            }),
        ));

        Ok(GenerationOutcome {
            generated_count: report.generated_count,
            cohort_year_id: cohort.id,
            conflicts_by_class: report.by_class,
            skipped_class_ids: skipped,
        })
    }

    async fn resolve_cohort(
        &self,
        level: EducationLevel,
        requested: Option<CohortYearId>,
    ) -> ServiceResult<CohortYear> {
        match requested {
            Some(id) => {
                let cohort = self.cohort_year(id).await?;
                if cohort.level != level {
                    return Err(ServiceError::validation(format!(
                        "Cohort year {} belongs to level {}, not {}",
                        id, cohort.level, level
                    )));
                }
                Ok(cohort)
            }
            None => self.repo.current_cohort_year(level).await.map_err(|e| {
                ServiceError::missing(e, format!("No current cohort year for level {}", level))
            }),
        }
    }

    async fn resolve_classes(
        &self,
        level: EducationLevel,
        requested: Option<&[ClassId]>,
    ) -> ServiceResult<Vec<SchoolClass>> {
        let Some(ids) = requested else {
            let mut classes = self.repo.list_classes(level).await?;
            classes.sort_by_key(|c| c.id);
            return Ok(classes);
        };

        if ids.is_empty() {
            return Err(ServiceError::validation("classIds must not be empty"));
        }

        let mut seen = HashSet::new();
        let mut classes = Vec::with_capacity(ids.len());
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            let class = self
                .repo
                .get_class(id)
                .await
                .map_err(|e| ServiceError::missing(e, format!("Class {} not found", id)))?;
            if class.level != level {
                return Err(ServiceError::validation(format!(
                    "Class {} belongs to level {}, not {}",
                    id, class.level, level
                )));
            }
            classes.push(class);
        }
        Ok(classes)
    }
}

