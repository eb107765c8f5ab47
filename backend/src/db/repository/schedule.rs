//! Schedule entry storage, partitioned by educational level.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    ClassId, CohortYearId, EducationLevel, EntryFilter, NewScheduleEntry, ScheduleEntry,
    ScheduleEntryId,
};

/// Repository trait for schedule entries.
///
/// Every call names the level partition it works on. Entry ids are unique
/// within a partition only.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// List entries of a partition matching `filter`, ordered by class, day
    /// and start time.
    async fn list_entries(
        &self,
        level: EducationLevel,
        filter: &EntryFilter,
    ) -> RepositoryResult<Vec<ScheduleEntry>>;

    /// Fetch one entry.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no entry has this id in the partition
    async fn get_entry(
        &self,
        level: EducationLevel,
        id: ScheduleEntryId,
    ) -> RepositoryResult<ScheduleEntry>;

    /// Replace every entry of a class for a cohort-year with `entries`.
    ///
    /// The delete and the inserts form one unit: if any new entry breaks the
    /// unique (class, cohort-year, day, start) key, nothing changes.
    ///
    /// # Returns
    /// * `Ok(Vec<ScheduleEntry>)` - The stored entries with their new ids
    async fn replace_class_entries(
        &self,
        level: EducationLevel,
        cohort_year_id: CohortYearId,
        class_id: ClassId,
        entries: Vec<NewScheduleEntry>,
    ) -> RepositoryResult<Vec<ScheduleEntry>>;

    /// Overwrite a stored entry. `updated_at` is set by the store.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConstraintViolation)` - If the new slot is already used by the class
    async fn update_entry(
        &self,
        level: EducationLevel,
        entry: ScheduleEntry,
    ) -> RepositoryResult<ScheduleEntry>;

    /// Delete one entry. Returns `false` if it did not exist.
    async fn delete_entry(&self, level: EducationLevel, id: ScheduleEntryId)
        -> RepositoryResult<bool>;

    /// Delete every entry of a cohort-year. Returns the number removed.
    async fn delete_cohort_year(
        &self,
        level: EducationLevel,
        cohort_year_id: CohortYearId,
    ) -> RepositoryResult<usize>;
}
