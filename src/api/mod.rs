//! HTTP surface for the worship-team front end.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::FixedOffset;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::archive::Archive;
use crate::gate::WeeklyResetGate;
use crate::jobs::Jobs;
use crate::mailer::Mailer;
use crate::playlist::Playlist;
use crate::schedule::Schedules;

pub mod archive;
pub mod crons;
pub mod error;
pub mod health;
pub mod music;
pub mod notices;
pub mod schedule;

pub use error::ApiError;

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub playlist: Playlist,
    pub archive: Archive,
    pub schedules: Schedules,
    pub jobs: Jobs,
}

impl AppState {
    /// Wire the services over one pool. The playlist handle (and with it the
    /// write lock) is shared by the gate, the schedule read and the jobs.
    pub fn new(pool: SqlitePool, offset: FixedOffset, mailer: Arc<dyn Mailer>) -> Self {
        let playlist = Playlist::new(pool.clone());
        let gate = WeeklyResetGate::new(playlist.clone());
        Self {
            archive: Archive::new(pool.clone()),
            schedules: Schedules::new(pool.clone(), gate.clone(), offset),
            jobs: Jobs::new(playlist.clone(), gate, mailer, offset),
            playlist,
            pool,
        }
    }
}

fn cors(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(err) => {
                warn!(?err, origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// Build the application router.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(music::routes())
        .merge(archive::routes())
        .merge(schedule::routes())
        .merge(notices::routes())
        .nest("/crons", crons::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors(allowed_origins))
        .with_state(state)
}
