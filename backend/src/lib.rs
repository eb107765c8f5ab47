//! # Timetable Rust Backend
//!
//! Weekly timetable generation for schools organised in educational levels
//! (primaire, collège, lycée).
//!
//! Given a fixed time grid and the teaching requirements of each class
//! ("teacher T gives subject S to class C for N hours a week"), the engine
//! places every hour on a free slot, never double-books a teacher across
//! classes, and reports what it could not place. Stored entries can then be
//! edited one by one under the same availability rule.
//!
//! ## Architecture
//!
//! - [`models`]: Domain types, identifiers and the time grid
//! - [`scheduler`]: Pure slot allocation and conflict reporting
//! - [`db`]: Repository traits and the in-memory store
//! - [`services`]: Generation runs, validated edits and read views
//! - [`config`]: TOML and environment configuration
//! - [`http`]: Axum-based REST API

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
