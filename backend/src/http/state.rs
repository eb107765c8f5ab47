//! Application state for the HTTP server.

use crate::services::ScheduleService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Generation, edits and read views over the configured repository
    pub service: ScheduleService,
}

impl AppState {
    pub fn new(service: ScheduleService) -> Self {
        Self { service }
    }
}
