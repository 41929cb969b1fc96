use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

use super::model::ArchiveRow;
use crate::error::Result;
use crate::model::ArchiveEntry;

const COLUMNS: &str =
    "id, name, link, letter, cifra, spotify, minister, search_text, created_by, created_at";

#[instrument(skip_all)]
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<ArchiveEntry>> {
    let row = sqlx::query_as::<_, ArchiveRow>(&format!(
        "SELECT {COLUMNS} FROM archive_entries WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(Into::into))
}

/// Id of an archived row with the same identity: the link when there is one,
/// otherwise the exact name, always paired with the minister (`NULL` matches `NULL`).
#[instrument(skip_all)]
pub async fn find_duplicate(
    conn: &mut SqliteConnection,
    link: Option<&str>,
    name: &str,
    minister: Option<&str>,
) -> Result<Option<String>> {
    let query = match link {
        Some(link) => {
            sqlx::query_scalar::<_, String>("SELECT id FROM archive_entries WHERE link = ? AND minister IS ? LIMIT 1")
                .bind(link.to_string())
        }
        None => {
            sqlx::query_scalar::<_, String>("SELECT id FROM archive_entries WHERE name = ? AND minister IS ? LIMIT 1")
                .bind(name.to_string())
        }
    };
    let id = query.bind(minister).fetch_optional(conn).await?;
    Ok(id)
}

#[instrument(skip_all)]
pub async fn insert(conn: &mut SqliteConnection, entry: &ArchiveEntry) -> Result<()> {
    sqlx::query(
        "INSERT INTO archive_entries (id, name, link, letter, cifra, spotify, minister, search_text, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.id)
    .bind(&entry.name)
    .bind(&entry.link)
    .bind(&entry.letter)
    .bind(&entry.cifra)
    .bind(&entry.spotify)
    .bind(&entry.minister)
    .bind(entry.search_tokens.join(" "))
    .bind(&entry.created_by)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Insert, or overwrite the mutable fields of the row already holding
/// `entry.id`. The existing row keeps its `created_at` and `created_by`.
#[instrument(skip_all)]
pub async fn upsert(conn: &mut SqliteConnection, entry: &ArchiveEntry) -> Result<()> {
    sqlx::query(
        "INSERT INTO archive_entries (id, name, link, letter, cifra, spotify, minister, search_text, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, link = excluded.link, letter = excluded.letter, \
         cifra = excluded.cifra, spotify = excluded.spotify, minister = excluded.minister, search_text = excluded.search_text",
    )
    .bind(&entry.id)
    .bind(&entry.name)
    .bind(&entry.link)
    .bind(&entry.letter)
    .bind(&entry.cifra)
    .bind(&entry.spotify)
    .bind(&entry.minister)
    .bind(entry.search_tokens.join(" "))
    .bind(&entry.created_by)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Overwrite the mutable fields of an archived row. `created_at` and
/// `created_by` never change once written.
#[instrument(skip_all)]
pub async fn update(conn: &mut SqliteConnection, entry: &ArchiveEntry) -> Result<u64> {
    let done = sqlx::query(
        "UPDATE archive_entries SET name = ?, link = ?, letter = ?, cifra = ?, spotify = ?, minister = ?, search_text = ? WHERE id = ?",
    )
    .bind(&entry.name)
    .bind(&entry.link)
    .bind(&entry.letter)
    .bind(&entry.cifra)
    .bind(&entry.spotify)
    .bind(&entry.minister)
    .bind(entry.search_tokens.join(" "))
    .bind(&entry.id)
    .execute(conn)
    .await?;
    Ok(done.rows_affected())
}

#[instrument(skip_all)]
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<u64> {
    let done = sqlx::query("DELETE FROM archive_entries WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(done.rows_affected())
}

fn escape_like(token: &str) -> String {
    token
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Newest-first page of archived rows where every query token is a prefix of
/// some stored token. Returns the total match count alongside the page.
#[instrument(skip_all)]
pub async fn search(
    pool: &SqlitePool,
    tokens: &[String],
    offset: i64,
    limit: i64,
) -> Result<(i64, Vec<ArchiveEntry>)> {
    let filter = if tokens.is_empty() {
        String::new()
    } else {
        let clauses = vec!["(' ' || search_text) LIKE ? ESCAPE '\\'"; tokens.len()];
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let patterns: Vec<String> = tokens
        .iter()
        .map(|t| format!("% {}%", escape_like(t)))
        .collect();

    let count_sql = format!("SELECT COUNT(*) FROM archive_entries{filter}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for p in &patterns {
        count_query = count_query.bind(p);
    }
    let total = count_query.fetch_one(pool).await?;

    let page_sql = format!(
        "SELECT {COLUMNS} FROM archive_entries{filter} ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?"
    );
    let mut page_query = sqlx::query_as::<_, ArchiveRow>(&page_sql);
    for p in &patterns {
        page_query = page_query.bind(p);
    }
    let rows = page_query.bind(limit).bind(offset).fetch_all(pool).await?;

    Ok((total, rows.into_iter().map(Into::into).collect()))
}
