//! Repository implementations.
//!
//! - `local`: in-memory store partitioned by education level, used by the
//!   server and by tests
pub mod local;

pub use local::LocalRepository;
