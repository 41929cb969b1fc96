//! Weekly reset of the live playlist.
//!
//! The gate remembers the date of the upcoming service it last saw. When a
//! caller observes a different date the playlist is cleared and the new date
//! stored, both in the same transaction. Observing the same date twice is a
//! no-op, so the read path and the periodic job can both call it.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::db;
use crate::error::Result;
use crate::playlist::{self, Playlist};

pub const UPCOMING_SERVICE_KEY: &str = "upcoming_service";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetOutcome {
    Unchanged,
    Cleared { removed: u64 },
}

impl ResetOutcome {
    pub fn cleared(&self) -> bool {
        matches!(self, ResetOutcome::Cleared { .. })
    }
}

#[derive(Clone)]
pub struct WeeklyResetGate {
    playlist: Playlist,
}

impl WeeklyResetGate {
    pub fn new(playlist: Playlist) -> Self {
        Self { playlist }
    }

    pub async fn last_known_date(&self) -> Result<Option<NaiveDate>> {
        let mut conn = self.playlist.pool().acquire().await?;
        let stored = db::meta::get(&mut conn, UPCOMING_SERVICE_KEY).await?;
        Ok(stored.and_then(|s| match s.parse::<NaiveDate>() {
            Ok(date) => Some(date),
            Err(err) => {
                warn!(?err, stored = %s, "ignoring unreadable upcoming service date");
                None
            }
        }))
    }

    /// Clear the playlist if `observed` differs from the stored date.
    #[instrument(skip(self))]
    pub async fn evaluate(&self, observed: NaiveDate) -> Result<ResetOutcome> {
        let observed_iso = observed.to_string();
        let mut ex = self.playlist.exclusive().await?;
        let stored = db::meta::get(&mut ex.tx, UPCOMING_SERVICE_KEY).await?;
        if stored.as_deref() == Some(observed_iso.as_str()) {
            ex.commit().await?;
            return Ok(ResetOutcome::Unchanged);
        }

        let removed = playlist::clear_in(&mut ex.tx).await?;
        db::meta::set(&mut ex.tx, UPCOMING_SERVICE_KEY, &observed_iso).await?;
        ex.commit().await?;
        info!(previous = ?stored, upcoming = %observed_iso, removed, "upcoming service changed; playlist reset");
        Ok(ResetOutcome::Cleared { removed })
    }

    /// Clear unconditionally and record `observed` as the current date.
    #[instrument(skip(self))]
    pub async fn force(&self, observed: NaiveDate) -> Result<u64> {
        let mut ex = self.playlist.exclusive().await?;
        let removed = playlist::clear_in(&mut ex.tx).await?;
        db::meta::set(&mut ex.tx, UPCOMING_SERVICE_KEY, &observed.to_string()).await?;
        ex.commit().await?;
        info!(upcoming = %observed, removed, "playlist reset forced");
        Ok(removed)
    }
}
