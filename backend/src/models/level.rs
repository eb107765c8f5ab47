//! Educational levels and the cohort-years scoped to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::CohortYearId;

/// Educational level. Each level is backed by its own storage partition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    /// Maternelle and primaire share one partition.
    #[serde(alias = "maternelle")]
    Primaire,
    #[serde(alias = "collège")]
    College,
    #[serde(alias = "lycée")]
    Lycee,
}

impl EducationLevel {
    /// Probe order used when an entry id is looked up without a level.
    pub const ALL: [EducationLevel; 3] = [
        EducationLevel::Primaire,
        EducationLevel::College,
        EducationLevel::Lycee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Primaire => "primaire",
            EducationLevel::College => "college",
            EducationLevel::Lycee => "lycee",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EducationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primaire" | "maternelle" => Ok(Self::Primaire),
            "college" | "collège" => Ok(Self::College),
            "lycee" | "lycée" => Ok(Self::Lycee),
            other => Err(format!("Unknown education level: {}", other)),
        }
    }
}

/// A school year scoped to one educational level, e.g. collège 2025-2026.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortYear {
    pub id: CohortYearId,
    pub level: EducationLevel,
    pub label: String,
    #[serde(default)]
    pub is_current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parses_accented_and_aliases() {
        assert_eq!("Collège".parse::<EducationLevel>().unwrap(), EducationLevel::College);
        assert_eq!("maternelle".parse::<EducationLevel>().unwrap(), EducationLevel::Primaire);
        assert_eq!("LYCEE".parse::<EducationLevel>().unwrap(), EducationLevel::Lycee);
        assert!("universite".parse::<EducationLevel>().is_err());
    }

    #[test]
    fn test_level_serde_representation() {
        let json = serde_json::to_string(&EducationLevel::College).unwrap();
        assert_eq!(json, "\"college\"");
        let level: EducationLevel = serde_json::from_str("\"lycée\"").unwrap();
        assert_eq!(level, EducationLevel::Lycee);
    }
}
