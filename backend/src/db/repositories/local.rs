//! In-memory repository.
//!
//! Schedule entries live in one partition per [`EducationLevel`], each with
//! its own id sequence, mirroring the per-level databases of a production
//! deployment. Reference data is shared and loaded from a [`ReferenceSeed`].
//!
//! All state sits behind a single `parking_lot::RwLock`; every trait method
//! takes the lock once, so each call is atomic with respect to the others.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::{
    ErrorContext, ReferenceRepository, RepositoryError, RepositoryResult, ScheduleRepository,
};
use crate::db::seed::ReferenceSeed;
use crate::models::{
    ClassId, CohortYear, CohortYearId, EducationLevel, EntryFilter, NewScheduleEntry,
    ScheduleEntry, ScheduleEntryId, SchoolClass, Subject, SubjectId, Teacher, TeacherId,
    TeachingRequirement,
};

#[derive(Debug, Default)]
struct Partition {
    entries: BTreeMap<ScheduleEntryId, ScheduleEntry>,
    next_id: i64,
}

impl Partition {
    fn allocate_id(&mut self) -> ScheduleEntryId {
        self.next_id += 1;
        ScheduleEntryId(self.next_id)
    }

    /// Id of another entry holding the same unique key, if any.
    fn key_holder(
        &self,
        class_id: ClassId,
        cohort_year_id: CohortYearId,
        slot: (u8, chrono::NaiveTime),
        except: Option<ScheduleEntryId>,
    ) -> Option<ScheduleEntryId> {
        self.entries
            .values()
            .find(|e| {
                Some(e.id) != except
                    && e.class_id == class_id
                    && e.cohort_year_id == cohort_year_id
                    && e.slot_key() == slot
            })
            .map(|e| e.id)
    }
}

#[derive(Debug, Default)]
struct LocalData {
    partitions: HashMap<EducationLevel, Partition>,
    classes: BTreeMap<ClassId, SchoolClass>,
    subjects: HashMap<SubjectId, Subject>,
    teachers: HashMap<TeacherId, Teacher>,
    cohort_years: BTreeMap<CohortYearId, CohortYear>,
    requirements: Vec<TeachingRequirement>,
}

/// In-memory implementation of every repository trait.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: ReferenceSeed) -> Self {
        let repo = Self::new();
        repo.load_seed(seed);
        repo
    }

    /// Add or replace reference records. Requirements are appended in order.
    pub fn load_seed(&self, seed: ReferenceSeed) {
        let mut data = self.data.write();
        for cohort in seed.cohort_years {
            data.cohort_years.insert(cohort.id, cohort);
        }
        for class in seed.classes {
            data.classes.insert(class.id, class);
        }
        for subject in seed.subjects {
            data.subjects.insert(subject.id, subject);
        }
        for teacher in seed.teachers {
            data.teachers.insert(teacher.id, teacher);
        }
        data.requirements.extend(seed.requirements);
    }

    /// Number of stored entries across all partitions.
    pub fn entry_count(&self) -> usize {
        self.data
            .read()
            .partitions
            .values()
            .map(|p| p.entries.len())
            .sum()
    }
}

fn not_found(entity: &str, id: impl ToString, operation: &str) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id),
    )
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn list_entries(
        &self,
        level: EducationLevel,
        filter: &EntryFilter,
    ) -> RepositoryResult<Vec<ScheduleEntry>> {
        let data = self.data.read();
        let mut entries: Vec<ScheduleEntry> = data
            .partitions
            .get(&level)
            .map(|p| {
                p.entries
                    .values()
                    .filter(|e| filter.matches(e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by_key(|e| (e.class_id, e.day_index, e.start, e.id));
        Ok(entries)
    }

    async fn get_entry(
        &self,
        level: EducationLevel,
        id: ScheduleEntryId,
    ) -> RepositoryResult<ScheduleEntry> {
        self.data
            .read()
            .partitions
            .get(&level)
            .and_then(|p| p.entries.get(&id))
            .cloned()
            .ok_or_else(|| not_found("schedule_entry", id, "get_entry"))
    }

    async fn replace_class_entries(
        &self,
        level: EducationLevel,
        cohort_year_id: CohortYearId,
        class_id: ClassId,
        entries: Vec<NewScheduleEntry>,
    ) -> RepositoryResult<Vec<ScheduleEntry>> {
        let ctx = || {
            ErrorContext::new("replace_class_entries")
                .with_entity("class")
                .with_entity_id(class_id)
        };

        let mut slots = std::collections::HashSet::new();
        for entry in &entries {
            if entry.class_id != class_id || entry.cohort_year_id != cohort_year_id {
                return Err(RepositoryError::validation_with_context(
                    format!(
                        "entry for class {} / cohort year {} in batch for class {} / cohort year {}",
                        entry.class_id, entry.cohort_year_id, class_id, cohort_year_id
                    ),
                    ctx(),
                ));
            }
            if !slots.insert(entry.slot_key()) {
                return Err(RepositoryError::constraint_with_context(
                    format!(
                        "class {} has two entries on day {} at {}",
                        class_id, entry.day_index, entry.start
                    ),
                    ctx(),
                ));
            }
        }

        let mut data = self.data.write();
        let partition = data.partitions.entry(level).or_default();
        partition
            .entries
            .retain(|_, e| !(e.class_id == class_id && e.cohort_year_id == cohort_year_id));

        let now = Utc::now();
        let mut stored = Vec::with_capacity(entries.len());
        for new in entries {
            let id = partition.allocate_id();
            let entry = ScheduleEntry {
                id,
                class_id: new.class_id,
                subject_id: new.subject_id,
                teacher_id: new.teacher_id,
                cohort_year_id: new.cohort_year_id,
                day_index: new.day_index,
                day_name: new.day_name,
                start: new.start,
                end: new.end,
                room: new.room,
                entry_type: new.entry_type,
                created_at: now,
                updated_at: now,
            };
            partition.entries.insert(id, entry.clone());
            stored.push(entry);
        }
        Ok(stored)
    }

    async fn update_entry(
        &self,
        level: EducationLevel,
        mut entry: ScheduleEntry,
    ) -> RepositoryResult<ScheduleEntry> {
        let mut data = self.data.write();
        let partition = data
            .partitions
            .get_mut(&level)
            .ok_or_else(|| not_found("schedule_entry", entry.id, "update_entry"))?;

        let created_at = match partition.entries.get(&entry.id) {
            Some(existing) => existing.created_at,
            None => return Err(not_found("schedule_entry", entry.id, "update_entry")),
        };

        if let Some(holder) = partition.key_holder(
            entry.class_id,
            entry.cohort_year_id,
            entry.slot_key(),
            Some(entry.id),
        ) {
            return Err(RepositoryError::constraint_with_context(
                format!(
                    "class {} already has entry {} on day {} at {}",
                    entry.class_id, holder, entry.day_index, entry.start
                ),
                ErrorContext::new("update_entry")
                    .with_entity("schedule_entry")
                    .with_entity_id(entry.id),
            ));
        }

        entry.created_at = created_at;
        entry.updated_at = Utc::now();
        partition.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn delete_entry(
        &self,
        level: EducationLevel,
        id: ScheduleEntryId,
    ) -> RepositoryResult<bool> {
        Ok(self
            .data
            .write()
            .partitions
            .get_mut(&level)
            .and_then(|p| p.entries.remove(&id))
            .is_some())
    }

    async fn delete_cohort_year(
        &self,
        level: EducationLevel,
        cohort_year_id: CohortYearId,
    ) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        let Some(partition) = data.partitions.get_mut(&level) else {
            return Ok(0);
        };
        let before = partition.entries.len();
        partition
            .entries
            .retain(|_, e| e.cohort_year_id != cohort_year_id);
        Ok(before - partition.entries.len())
    }
}

#[async_trait]
impl ReferenceRepository for LocalRepository {
    async fn get_class(&self, id: ClassId) -> RepositoryResult<SchoolClass> {
        self.data
            .read()
            .classes
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("class", id, "get_class"))
    }

    async fn list_classes(&self, level: EducationLevel) -> RepositoryResult<Vec<SchoolClass>> {
        Ok(self
            .data
            .read()
            .classes
            .values()
            .filter(|c| c.level == level)
            .cloned()
            .collect())
    }

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject> {
        self.data
            .read()
            .subjects
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("subject", id, "get_subject"))
    }

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher> {
        self.data
            .read()
            .teachers
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("teacher", id, "get_teacher"))
    }

    async fn get_cohort_year(&self, id: CohortYearId) -> RepositoryResult<CohortYear> {
        self.data
            .read()
            .cohort_years
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("cohort_year", id, "get_cohort_year"))
    }

    async fn current_cohort_year(&self, level: EducationLevel) -> RepositoryResult<CohortYear> {
        self.data
            .read()
            .cohort_years
            .values()
            .find(|c| c.level == level && c.is_current)
            .cloned()
            .ok_or_else(|| not_found("cohort_year", level, "current_cohort_year"))
    }

    async fn list_requirements(
        &self,
        cohort_year_id: CohortYearId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<TeachingRequirement>> {
        Ok(self
            .data
            .read()
            .requirements
            .iter()
            .filter(|r| r.class_id == class_id && r.cohort_year_id == cohort_year_id)
            .cloned()
            .collect())
    }
}
