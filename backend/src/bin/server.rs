//! Timetable HTTP Server Binary
//!
//! Main entry point for the timetable REST API server. It loads the
//! configuration and reference seed, builds the schedule service and starts
//! serving requests.
//!
//! # Usage
//!
//! ```bash
//! SEED_FILE=data/reference.json cargo run --bin timetable-server
//! ```
//!
//! # Environment Variables
//!
//! - `TIMETABLE_CONFIG`: Path to `timetable.toml` (default: searched)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `SEED_FILE`: JSON reference data to load at startup
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use timetable_rust::config::AppConfig;
use timetable_rust::db::{FullRepository, LocalRepository, ReferenceSeed};
use timetable_rust::http::{create_router, AppState};
use timetable_rust::services::ScheduleService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting timetable HTTP server");

    let config = AppConfig::load().context("loading configuration")?;

    let repository = LocalRepository::new();
    match &config.seed_file {
        Some(path) => {
            let seed = ReferenceSeed::from_file(path)
                .with_context(|| format!("loading seed {}", path.display()))?;
            repository.load_seed(seed);
        }
        None => warn!("No seed file configured; reference data is empty"),
    }
    let repository: Arc<dyn FullRepository> = Arc::new(repository);
    info!("Repository initialized successfully");

    let grid = config.time_grid();
    info!(
        "Time grid: {} days, {} teaching slots per week",
        grid.days().len(),
        grid.teaching_slot_count()
    );
    let service =
        ScheduleService::new(repository, grid).with_settings(config.generation_settings());

    let app = create_router(AppState::new(service));

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
