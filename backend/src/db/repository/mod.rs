//! Repository traits for the timetable store.
//!
//! - [`ScheduleRepository`]: schedule entries, one partition per level
//! - [`ReferenceRepository`]: classes, subjects, teachers, cohort-years and
//!   teaching requirements (read-only)
//!
//! Services depend on [`FullRepository`] so a single handle covers both.

pub mod error;
pub mod reference;
pub mod schedule;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use reference::ReferenceRepository;
pub use schedule::ScheduleRepository;

/// Composite trait for a store that implements every repository trait.
pub trait FullRepository: ScheduleRepository + ReferenceRepository {}

impl<T> FullRepository for T where T: ScheduleRepository + ReferenceRepository {}
