use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::error::Result;

#[instrument(skip_all)]
pub async fn get(conn: &mut SqliteConnection, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM schedule_meta WHERE key = ?")
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(value)
}

#[instrument(skip_all)]
pub async fn set(conn: &mut SqliteConnection, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO schedule_meta (key, value, updated_at) VALUES (?, ?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}
