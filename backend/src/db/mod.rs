//! Storage for schedule entries and the reference data they point at.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service layer (services::ScheduleService)              │
//! │  - generation, edit validation, projections             │
//! │  - per cohort-year serialization                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │     (in-memory, one partition per level)      │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! Callers pass the [`EducationLevel`](crate::models::EducationLevel) of the
//! cohort-year they work on; which partition backs it is the repository's
//! concern.

pub mod repositories;
pub mod repository;
pub mod seed;

pub use repositories::LocalRepository;
pub use repository::{
    ErrorContext, FullRepository, ReferenceRepository, RepositoryError, RepositoryResult,
    ScheduleRepository,
};
pub use seed::ReferenceSeed;
