use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use crate::error::Result;
use crate::model::{Notice, NoticeKind};

#[instrument(skip_all)]
pub async fn get(pool: &SqlitePool, kind: NoticeKind) -> Result<Option<Notice>> {
    let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
        "SELECT text, updated_at FROM notices WHERE kind = ?",
    )
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(text, timestamp)| Notice { text, timestamp }))
}

#[instrument(skip_all)]
pub async fn set(pool: &SqlitePool, kind: NoticeKind, text: &str) -> Result<Notice> {
    let timestamp = Utc::now();
    sqlx::query(
        "INSERT INTO notices (kind, text, updated_at) VALUES (?, ?, ?) \
         ON CONFLICT(kind) DO UPDATE SET text = excluded.text, updated_at = excluded.updated_at",
    )
    .bind(kind.as_str())
    .bind(text)
    .bind(timestamp)
    .execute(pool)
    .await?;
    Ok(Notice {
        text: text.to_string(),
        timestamp,
    })
}
