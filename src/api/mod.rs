//! REST API over the analytics engine (feature `api`).
//!
//! Routes:
//! - `GET /harvest` harvest outlook for every cage, soonest first
//! - `GET /cages/{id}/harvest` harvest estimate for one cage
//! - `GET /cages/{id}/history` biomass/FCR series for one cage
//! - `GET /cages/{id}/schedule` active schedule with next and upcoming feedings
//! - `POST /schedules/auto-generate` batch schedule generation
//! - `GET /samplings/{id}/report` full sampling report
//! - `GET /reports/summary` totals across all samplings
//! - `GET /dashboard` period analytics against the preceding period
//! - `GET /settings`, `PUT /settings` harvest settings, read fresh per request

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chrono::{Local, NaiveDateTime};

use crate::config::{AnalyticsConfig, SettingsStore};
use crate::dataset::FarmData;
use crate::feeding::ScheduleBook;

pub use types::{
    AutoGenerateRequest, CageScheduleResponse, DashboardQuery, ErrorResponse, FieldErrorBody,
    ScheduleView,
};

/// State shared by all handlers.
///
/// The dataset is read-only; schedules and harvest settings carry their own
/// locks.
pub struct AppState {
    pub data: FarmData,
    pub config: AnalyticsConfig,
    pub settings: SettingsStore,
    pub schedules: ScheduleBook,
    /// Fixed clock for reproducible responses; wall clock when `None`.
    pub fixed_now: Option<NaiveDateTime>,
}

impl AppState {
    pub fn new(data: FarmData, config: AnalyticsConfig) -> Self {
        Self {
            settings: SettingsStore::new(config.harvest),
            data,
            config,
            schedules: ScheduleBook::new(),
            fixed_now: None,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.fixed_now
            .unwrap_or_else(|| Local::now().naive_local())
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/harvest", get(handlers::get_harvest_outlook))
        .route("/cages/{id}/harvest", get(handlers::get_cage_harvest))
        .route("/cages/{id}/history", get(handlers::get_cage_history))
        .route("/cages/{id}/schedule", get(handlers::get_cage_schedule))
        .route("/schedules/auto-generate", post(handlers::auto_generate))
        .route("/samplings/{id}/report", get(handlers::get_sampling_report))
        .route("/reports/summary", get(handlers::get_summary))
        .route("/dashboard", get(handlers::get_dashboard))
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process exits.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
