//! JSON reference data loaded into the in-memory store at startup.
//!
//! ```json
//! {
//!   "cohortYears": [{"id": 1, "level": "college", "label": "2025-2026", "isCurrent": true}],
//!   "classes": [{"id": 10, "name": "6e A", "level": "college"}],
//!   "subjects": [{"id": 1, "name": "Mathématiques", "code": "MATH"}],
//!   "teachers": [{"id": 1, "firstName": "Awa", "lastName": "Diallo"}],
//!   "requirements": [{"teacherId": 1, "subjectId": 1, "classId": 10,
//!                     "cohortYearId": 1, "weeklyHoursNeeded": 4}]
//! }
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{CohortYear, EducationLevel, SchoolClass, Subject, Teacher, TeachingRequirement};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceSeed {
    pub cohort_years: Vec<CohortYear>,
    pub classes: Vec<SchoolClass>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub requirements: Vec<TeachingRequirement>,
}

impl ReferenceSeed {
    pub fn from_json(json: &str) -> RepositoryResult<Self> {
        let seed: Self = serde_json::from_str(json)?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn from_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration_with_context(
                e.to_string(),
                ErrorContext::new("load_seed").with_details(path.display().to_string()),
            )
        })?;
        let seed = Self::from_json(&raw)?;
        info!(
            "Loaded reference seed {}: {} classes, {} teachers, {} requirements",
            path.display(),
            seed.classes.len(),
            seed.teachers.len(),
            seed.requirements.len()
        );
        Ok(seed)
    }

    /// Check cross references: requirements must point at known records and
    /// each level has at most one current cohort-year.
    pub fn validate(&self) -> RepositoryResult<()> {
        let classes: HashSet<_> = self.classes.iter().map(|c| c.id).collect();
        let subjects: HashSet<_> = self.subjects.iter().map(|s| s.id).collect();
        let teachers: HashSet<_> = self.teachers.iter().map(|t| t.id).collect();
        let cohorts: HashSet<_> = self.cohort_years.iter().map(|c| c.id).collect();

        for (index, req) in self.requirements.iter().enumerate() {
            let missing = if !classes.contains(&req.class_id) {
                Some(format!("class {}", req.class_id))
            } else if !subjects.contains(&req.subject_id) {
                Some(format!("subject {}", req.subject_id))
            } else if !teachers.contains(&req.teacher_id) {
                Some(format!("teacher {}", req.teacher_id))
            } else if !cohorts.contains(&req.cohort_year_id) {
                Some(format!("cohort year {}", req.cohort_year_id))
            } else {
                None
            };
            if let Some(what) = missing {
                return Err(RepositoryError::validation_with_context(
                    format!("requirement references unknown {}", what),
                    ErrorContext::new("validate_seed")
                        .with_entity("requirement")
                        .with_entity_id(index),
                ));
            }
        }

        for level in EducationLevel::ALL {
            let current = self
                .cohort_years
                .iter()
                .filter(|c| c.level == level && c.is_current)
                .count();
            if current > 1 {
                return Err(RepositoryError::validation_with_context(
                    format!("{} current cohort years for level {}", current, level),
                    ErrorContext::new("validate_seed").with_entity("cohort_year"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "cohortYears": [{"id": 1, "level": "collège", "label": "2025-2026", "isCurrent": true}],
        "classes": [{"id": 10, "name": "6e A", "level": "college"}],
        "subjects": [{"id": 1, "name": "Mathématiques", "code": "MATH"}],
        "teachers": [{"id": 1, "firstName": "Awa", "lastName": "Diallo"}],
        "requirements": [{"teacherId": 1, "subjectId": 1, "classId": 10,
                          "cohortYearId": 1, "weeklyHoursNeeded": 4}]
    }"#;

    #[test]
    fn test_parses_seed() {
        let seed = ReferenceSeed::from_json(SEED).unwrap();
        assert_eq!(seed.cohort_years[0].level, EducationLevel::College);
        assert_eq!(seed.requirements[0].weekly_hours_needed, 4);
        assert_eq!(seed.teachers[0].display_name(), "Awa Diallo");
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed = ReferenceSeed::from_json("{}").unwrap();
        assert!(seed.classes.is_empty());
    }

    #[test]
    fn test_rejects_dangling_requirement() {
        let bad = SEED.replace(r#""classId": 10"#, r#""classId": 99"#);
        let err = ReferenceSeed::from_json(&bad).unwrap_err();
        assert!(err.to_string().contains("unknown class 99"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = ReferenceSeed::from_json("{\"classes\": [").unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }
}
