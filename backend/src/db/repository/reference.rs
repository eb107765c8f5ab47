//! Read-only access to reference data owned by other parts of the school
//! system.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    ClassId, CohortYear, CohortYearId, EducationLevel, SchoolClass, Subject, SubjectId, Teacher,
    TeacherId, TeachingRequirement,
};

/// Lookup of classes, subjects, teachers, cohort-years and the requirement
/// catalog. Missing records are reported as `NotFound`.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn get_class(&self, id: ClassId) -> RepositoryResult<SchoolClass>;

    /// Classes of a level, ordered by id.
    async fn list_classes(&self, level: EducationLevel) -> RepositoryResult<Vec<SchoolClass>>;

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject>;

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher>;

    async fn get_cohort_year(&self, id: CohortYearId) -> RepositoryResult<CohortYear>;

    /// The academic year currently open for a level.
    async fn current_cohort_year(&self, level: EducationLevel) -> RepositoryResult<CohortYear>;

    /// Requirements of one class for one cohort-year, in catalog order.
    async fn list_requirements(
        &self,
        cohort_year_id: CohortYearId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<TeachingRequirement>>;
}
