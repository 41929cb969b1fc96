//! Monthly rehearsal schedule and the "next Sunday" read.
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use crate::db;
use crate::error::{Error, Result};
use crate::gate::WeeklyResetGate;
use crate::model::{Assignments, ServiceDay, UpcomingSchedule};

/// Date of the next service as seen from `now` in `offset`: today when it is
/// Sunday, otherwise the coming Sunday.
pub fn upcoming_service_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    let today = now.with_timezone(&offset).date_naive();
    let days_until_sunday = (7 - today.weekday().num_days_from_sunday()) % 7;
    today + chrono::Days::new(u64::from(days_until_sunday))
}

/// Document key for the month holding `date`: `MM-YYYY`.
pub fn month_id(date: NaiveDate) -> String {
    format!("{:02}-{}", date.month(), date.year())
}

/// Validate a `MM-YYYY` key coming from a caller.
pub fn parse_month_id(raw: &str) -> Result<String> {
    let invalid = || Error::validation(format!("month must look like MM-YYYY, got {raw:?}"));
    let (month, year) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    Ok(month_id(first))
}

#[derive(Clone)]
pub struct Schedules {
    pool: SqlitePool,
    gate: WeeklyResetGate,
    offset: FixedOffset,
    /// Serializes read-modify-write of month documents.
    write_lock: Arc<Mutex<()>>,
}

impl Schedules {
    pub fn new(pool: SqlitePool, gate: WeeklyResetGate, offset: FixedOffset) -> Self {
        Self {
            pool,
            gate,
            offset,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub async fn month(&self, month_id: &str) -> Result<Vec<ServiceDay>> {
        let key = parse_month_id(month_id)?;
        let mut conn = self.pool.acquire().await?;
        db::schedule::get_month(&mut conn, &key)
            .await?
            .ok_or_else(|| Error::not_found(format!("schedule for {key}")))
    }

    /// Store the assignments for `date`, replacing an existing entry for the
    /// same date or appending a new one to its month.
    #[instrument(skip(self, assignments))]
    pub async fn upsert_day(&self, date: NaiveDate, assignments: Assignments) -> Result<()> {
        let key = month_id(date);
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut days = db::schedule::get_month(&mut tx, &key)
            .await?
            .unwrap_or_default();
        match days.iter_mut().find(|d| d.date == date) {
            Some(day) => day.assignments = assignments,
            None => {
                days.push(ServiceDay { date, assignments });
                days.sort_by_key(|d| d.date);
            }
        }
        db::schedule::put_month(&mut tx, &key, &days).await?;
        tx.commit().await?;
        info!(month = %key, %date, "schedule saved");
        Ok(())
    }

    /// The upcoming service plus whether observing it reset the playlist.
    ///
    /// The month document must exist. The gate then runs; a gate failure is
    /// logged and reported as "not cleared" rather than failing the read.
    #[instrument(skip(self))]
    pub async fn upcoming(&self, now: DateTime<Utc>) -> Result<UpcomingSchedule> {
        let date = upcoming_service_date(now, self.offset);
        let days = self.month(&month_id(date)).await?;

        let cleared_playlist = match self.gate.evaluate(date).await {
            Ok(outcome) => outcome.cleared(),
            Err(err) => {
                error!(?err, %date, "weekly reset check failed");
                false
            }
        };

        let day = days
            .into_iter()
            .find(|d| d.date == date)
            .ok_or_else(|| Error::not_found(format!("schedule for {date}")))?;

        Ok(UpcomingSchedule {
            date,
            assignments: day.assignments,
            cleared_playlist,
        })
    }
}
