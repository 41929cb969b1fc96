use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use super::model::PlaylistRow;
use crate::error::Result;
use crate::model::PlaylistEntry;

const COLUMNS: &str = "id, name, link, letter, cifra, spotify, minister, rank, created_by";

#[instrument(skip_all)]
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<PlaylistEntry>> {
    let row = sqlx::query_as::<_, PlaylistRow>(&format!(
        "SELECT {COLUMNS} FROM playlist_entries WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(Into::into))
}

/// All live entries, lowest rank first. Ties (only possible after an
/// interrupted pass) fall back to insertion order.
#[instrument(skip_all)]
pub async fn list_ordered(conn: &mut SqliteConnection) -> Result<Vec<PlaylistEntry>> {
    let rows = sqlx::query_as::<_, PlaylistRow>(&format!(
        "SELECT {COLUMNS} FROM playlist_entries ORDER BY rank ASC, created_at ASC, id ASC"
    ))
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

#[instrument(skip_all)]
pub async fn max_rank(conn: &mut SqliteConnection) -> Result<i64> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(rank) FROM playlist_entries")
        .fetch_one(conn)
        .await?;
    Ok(max.unwrap_or(0))
}

#[instrument(skip_all)]
pub async fn insert(conn: &mut SqliteConnection, entry: &PlaylistEntry) -> Result<()> {
    sqlx::query(
        "INSERT INTO playlist_entries (id, name, link, letter, cifra, spotify, minister, rank, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.id)
    .bind(&entry.name)
    .bind(&entry.link)
    .bind(&entry.letter)
    .bind(&entry.cifra)
    .bind(&entry.spotify)
    .bind(&entry.minister)
    .bind(entry.rank)
    .bind(&entry.created_by)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Overwrite every content field of an entry. Rank is left alone.
#[instrument(skip_all)]
pub async fn update_content(conn: &mut SqliteConnection, entry: &PlaylistEntry) -> Result<()> {
    sqlx::query(
        "UPDATE playlist_entries SET name = ?, link = ?, letter = ?, cifra = ?, spotify = ?, minister = ? WHERE id = ?",
    )
    .bind(&entry.name)
    .bind(&entry.link)
    .bind(&entry.letter)
    .bind(&entry.cifra)
    .bind(&entry.spotify)
    .bind(&entry.minister)
    .bind(&entry.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_rank(conn: &mut SqliteConnection, id: &str, rank: i64) -> Result<()> {
    sqlx::query("UPDATE playlist_entries SET rank = ? WHERE id = ?")
        .bind(rank)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns the number of rows removed (0 or 1).
#[instrument(skip_all)]
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<u64> {
    let done = sqlx::query("DELETE FROM playlist_entries WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(done.rows_affected())
}

#[instrument(skip_all)]
pub async fn delete_all(conn: &mut SqliteConnection) -> Result<u64> {
    let done = sqlx::query("DELETE FROM playlist_entries")
        .execute(conn)
        .await?;
    Ok(done.rows_affected())
}
