use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::error::Result;
use crate::model::ServiceDay;

/// Service days stored for a month (`MM-YYYY`), or `None` when the month
/// document was never written.
#[instrument(skip_all)]
pub async fn get_month(conn: &mut SqliteConnection, month_id: &str) -> Result<Option<Vec<ServiceDay>>> {
    let raw = sqlx::query_scalar::<_, String>("SELECT days FROM schedules WHERE month_id = ?")
        .bind(month_id)
        .fetch_optional(conn)
        .await?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

#[instrument(skip_all)]
pub async fn put_month(conn: &mut SqliteConnection, month_id: &str, days: &[ServiceDay]) -> Result<()> {
    let raw = serde_json::to_string(days)?;
    sqlx::query(
        "INSERT INTO schedules (month_id, days, updated_at) VALUES (?, ?, ?) \
         ON CONFLICT(month_id) DO UPDATE SET days = excluded.days, updated_at = excluded.updated_at",
    )
    .bind(month_id)
    .bind(raw)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}
