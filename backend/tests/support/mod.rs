#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveTime;
use timetable_rust::db::{
    FullRepository, LocalRepository, ReferenceRepository, ReferenceSeed, RepositoryResult,
    ScheduleRepository,
};
use timetable_rust::models::{
    ClassId, CohortYear, CohortYearId, DayDefinition, EducationLevel, EntryFilter,
    NewScheduleEntry, SchoolClass, ScheduleEntry, ScheduleEntryId, SlotCategory, SlotTemplate,
    Subject, SubjectId, Teacher, TeacherId, TeachingRequirement, TimeGrid,
};
use timetable_rust::services::{GenerationSettings, MemoryAuditSink, ScheduleService};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Reference data
// =============================================================================

pub const COLLEGE_CURRENT: CohortYearId = CohortYearId(1);
pub const LYCEE_CURRENT: CohortYearId = CohortYearId(2);
pub const COLLEGE_PREVIOUS: CohortYearId = CohortYearId(3);

pub const SIXIEME_A: ClassId = ClassId(10);
pub const SIXIEME_B: ClassId = ClassId(11);
pub const SECONDE_A: ClassId = ClassId(20);

pub const MATH: SubjectId = SubjectId(1);
pub const FRENCH: SubjectId = SubjectId(2);

pub const DIALLO: TeacherId = TeacherId(1);
pub const TRAORE: TeacherId = TeacherId(2);

pub fn hm(value: &str) -> NaiveTime {
    timetable_rust::models::hhmm::parse(value).unwrap()
}

/// `days` days, two one-hour teaching slots each (08:00 and 09:00).
pub fn two_slot_grid(days: u8) -> TimeGrid {
    let names = ["Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi"];
    TimeGrid::new(
        (1..=days)
            .map(|index| DayDefinition {
                index,
                name: names[(index - 1) as usize].to_string(),
                slots: None,
            })
            .collect(),
        vec![
            SlotTemplate::new(hm("08:00"), hm("09:00"), SlotCategory::Teaching),
            SlotTemplate::new(hm("09:00"), hm("10:00"), SlotCategory::Teaching),
        ],
    )
    .unwrap()
}

pub fn requirement(
    teacher_id: TeacherId,
    subject_id: SubjectId,
    class_id: ClassId,
    cohort_year_id: CohortYearId,
    hours: u32,
) -> TeachingRequirement {
    TeachingRequirement {
        teacher_id,
        subject_id,
        class_id,
        cohort_year_id,
        weekly_hours_needed: hours,
    }
}

/// Two collège classes, one lycée class, two subjects, two teachers.
pub fn seed(requirements: Vec<TeachingRequirement>) -> ReferenceSeed {
    ReferenceSeed {
        cohort_years: vec![
            CohortYear {
                id: COLLEGE_CURRENT,
                level: EducationLevel::College,
                label: "2025-2026".into(),
                is_current: true,
            },
            CohortYear {
                id: LYCEE_CURRENT,
                level: EducationLevel::Lycee,
                label: "2025-2026".into(),
                is_current: true,
            },
            CohortYear {
                id: COLLEGE_PREVIOUS,
                level: EducationLevel::College,
                label: "2024-2025".into(),
                is_current: false,
            },
        ],
        classes: vec![
            SchoolClass {
                id: SIXIEME_A,
                name: "6e A".into(),
                level: EducationLevel::College,
            },
            SchoolClass {
                id: SIXIEME_B,
                name: "6e B".into(),
                level: EducationLevel::College,
            },
            SchoolClass {
                id: SECONDE_A,
                name: "2nde A".into(),
                level: EducationLevel::Lycee,
            },
        ],
        subjects: vec![
            Subject {
                id: MATH,
                name: "Mathématiques".into(),
                code: "MATH".into(),
            },
            Subject {
                id: FRENCH,
                name: "Français".into(),
                code: "FR".into(),
            },
        ],
        teachers: vec![
            Teacher {
                id: DIALLO,
                first_name: "Awa".into(),
                last_name: "Diallo".into(),
            },
            Teacher {
                id: TRAORE,
                first_name: "Moussa".into(),
                last_name: "Traoré".into(),
            },
        ],
        requirements,
    }
}

/// A service over a seeded in-memory store, with handles for inspection.
pub struct Harness {
    pub service: ScheduleService,
    pub repo: LocalRepository,
    pub audit: MemoryAuditSink,
}

impl Harness {
    pub fn new(grid: TimeGrid, requirements: Vec<TeachingRequirement>) -> Self {
        Self::with_settings(grid, requirements, GenerationSettings::default())
    }

    pub fn with_settings(
        grid: TimeGrid,
        requirements: Vec<TeachingRequirement>,
        settings: GenerationSettings,
    ) -> Self {
        let repo = LocalRepository::from_seed(seed(requirements));
        let shared: Arc<dyn FullRepository> = Arc::new(repo.clone());
        Self::build(shared, repo, grid, settings)
    }

    /// Like [`Harness::new`], but every store call yields to the runtime
    /// first, so concurrent service calls interleave.
    pub fn yielding(grid: TimeGrid, requirements: Vec<TeachingRequirement>) -> Self {
        let repo = LocalRepository::from_seed(seed(requirements));
        let shared: Arc<dyn FullRepository> = Arc::new(YieldingRepository(repo.clone()));
        Self::build(shared, repo, grid, GenerationSettings::default())
    }

    fn build(
        shared: Arc<dyn FullRepository>,
        repo: LocalRepository,
        grid: TimeGrid,
        settings: GenerationSettings,
    ) -> Self {
        let audit = MemoryAuditSink::new();
        let service = ScheduleService::new(shared, grid)
            .with_settings(settings)
            .with_audit(Arc::new(audit.clone()));
        Self {
            service,
            repo,
            audit,
        }
    }
}

// =============================================================================
// Interleaving store
// =============================================================================

/// Delegates to a [`LocalRepository`], yielding before each call.
pub struct YieldingRepository(pub LocalRepository);

#[async_trait]
impl ScheduleRepository for YieldingRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        tokio::task::yield_now().await;
        self.0.health_check().await
    }

    async fn list_entries(
        &self,
        level: EducationLevel,
        filter: &EntryFilter,
    ) -> RepositoryResult<Vec<ScheduleEntry>> {
        tokio::task::yield_now().await;
        self.0.list_entries(level, filter).await
    }

    async fn get_entry(
        &self,
        level: EducationLevel,
        id: ScheduleEntryId,
    ) -> RepositoryResult<ScheduleEntry> {
        tokio::task::yield_now().await;
        self.0.get_entry(level, id).await
    }

    async fn replace_class_entries(
        &self,
        level: EducationLevel,
        cohort_year_id: CohortYearId,
        class_id: ClassId,
        entries: Vec<NewScheduleEntry>,
    ) -> RepositoryResult<Vec<ScheduleEntry>> {
        tokio::task::yield_now().await;
        self.0
            .replace_class_entries(level, cohort_year_id, class_id, entries)
            .await
    }

    async fn update_entry(
        &self,
        level: EducationLevel,
        entry: ScheduleEntry,
    ) -> RepositoryResult<ScheduleEntry> {
        tokio::task::yield_now().await;
        self.0.update_entry(level, entry).await
    }

    async fn delete_entry(
        &self,
        level: EducationLevel,
        id: ScheduleEntryId,
    ) -> RepositoryResult<bool> {
        tokio::task::yield_now().await;
        self.0.delete_entry(level, id).await
    }

    async fn delete_cohort_year(
        &self,
        level: EducationLevel,
        cohort_year_id: CohortYearId,
    ) -> RepositoryResult<usize> {
        tokio::task::yield_now().await;
        self.0.delete_cohort_year(level, cohort_year_id).await
    }
}

#[async_trait]
impl ReferenceRepository for YieldingRepository {
    async fn get_class(&self, id: ClassId) -> RepositoryResult<SchoolClass> {
        tokio::task::yield_now().await;
        self.0.get_class(id).await
    }

    async fn list_classes(&self, level: EducationLevel) -> RepositoryResult<Vec<SchoolClass>> {
        tokio::task::yield_now().await;
        self.0.list_classes(level).await
    }

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject> {
        tokio::task::yield_now().await;
        self.0.get_subject(id).await
    }

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher> {
        tokio::task::yield_now().await;
        self.0.get_teacher(id).await
    }

    async fn get_cohort_year(&self, id: CohortYearId) -> RepositoryResult<CohortYear> {
        tokio::task::yield_now().await;
        self.0.get_cohort_year(id).await
    }

    async fn current_cohort_year(&self, level: EducationLevel) -> RepositoryResult<CohortYear> {
        tokio::task::yield_now().await;
        self.0.current_cohort_year(level).await
    }

    async fn list_requirements(
        &self,
        cohort_year_id: CohortYearId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<TeachingRequirement>> {
        tokio::task::yield_now().await;
        self.0.list_requirements(cohort_year_id, class_id).await
    }
}
