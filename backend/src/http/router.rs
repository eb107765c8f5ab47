//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/schedules", get(handlers::list_schedules))
        .route("/schedules/time-grid", get(handlers::get_time_grid))
        .route("/schedules/generate", post(handlers::generate_schedules))
        .route("/schedules/class/{class_id}", get(handlers::get_class_schedule))
        .route(
            "/schedules/teacher/{teacher_id}",
            get(handlers::get_teacher_schedule),
        )
        .route(
            "/schedules/cohort-years/{cohort_year_id}",
            delete(handlers::retire_cohort_year),
        )
        .route(
            "/schedules/{id}",
            get(handlers::get_schedule)
                .put(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
