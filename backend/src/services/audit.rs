//! Audit events for schedule changes.
//!
//! Events are fire-and-forget: a sink never fails the operation that emits
//! it. Production uses [`LogAuditSink`]; tests inspect a [`MemoryAuditSink`].

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{CohortYearId, EducationLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    GenerationCompleted,
    EntryUpdated,
    EntryDeleted,
    CohortYearRetired,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::GenerationCompleted => "generation_completed",
            AuditAction::EntryUpdated => "entry_updated",
            AuditAction::EntryDeleted => "entry_deleted",
            AuditAction::CohortYearRetired => "cohort_year_retired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub action: AuditAction,
    pub level: EducationLevel,
    pub cohort_year_id: CohortYearId,
    /// e.g. `schedule_entry:42` or `class:7,8`
    pub resource: String,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        level: EducationLevel,
        cohort_year_id: CohortYearId,
        resource: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            action,
            level,
            cohort_year_id,
            resource: resource.into(),
            details,
            recorded_at: Utc::now(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Writes events to the `audit` log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn emit(&self, event: AuditEvent) {
        log::info!(
            target: "audit",
            "{} level={} cohort_year={} resource={} event_id={} details={}",
            event.action.as_str(),
            event.level,
            event.cohort_year_id,
            event.resource,
            event.event_id,
            event.details
        );
    }
}

/// Keeps events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.events.read().iter().map(|e| e.action).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        self.events.write().push(event);
    }
}
