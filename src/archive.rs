//! Permanent history of every song that reached the playlist.
//!
//! Two ways in: the mirror functions, called inside the playlist's
//! transaction whenever the live list changes, and [`Archive`], the direct
//! curation surface which skips de-duplication entirely.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db;
use crate::error::{Error, Result};
use crate::links::canonicalize;
use crate::model::{ArchiveDraft, ArchiveEntry, ArchivePage, PlaylistEntry, PlaylistUpdate};
use crate::playlist::{non_empty, required_name};
use crate::text::normalize;

pub const DEFAULT_PAGE_SIZE: u32 = 15;

fn from_live(entry: &PlaylistEntry) -> ArchiveEntry {
    ArchiveEntry {
        id: entry.id.clone(),
        name: entry.name.clone(),
        link: entry.link.clone(),
        letter: entry.letter.clone(),
        cifra: entry.cifra.clone(),
        spotify: entry.spotify.clone(),
        minister: entry.minister.clone(),
        search_tokens: normalize(&entry.name),
        created_by: entry.created_by.clone(),
        created_at: Utc::now(),
    }
}

/// Record a newly added live entry unless the same song (by link, or by name
/// when there is no link) was already archived for the same minister.
/// A reused id takes over the history row that already carries it.
/// Returns whether a row was written.
#[instrument(skip_all)]
pub async fn mirror_on_add(conn: &mut SqliteConnection, entry: &PlaylistEntry) -> Result<bool> {
    let duplicate = db::archive::find_duplicate(
        &mut *conn,
        entry.link.as_deref(),
        entry.name.trim(),
        entry.minister.as_deref(),
    )
    .await?;
    if let Some(existing) = duplicate {
        debug!(id = %entry.id, existing = %existing, "song already archived for this minister");
        return Ok(false);
    }
    db::archive::upsert(conn, &from_live(entry)).await?;
    Ok(true)
}

/// Merge an updated live entry into the archive row with the same id,
/// creating it when missing. Only the fields the patch supplied are
/// overwritten; name, search tokens and minister always follow the live entry.
#[instrument(skip_all)]
pub async fn mirror_on_update(
    conn: &mut SqliteConnection,
    entry: &PlaylistEntry,
    patch: &PlaylistUpdate,
) -> Result<()> {
    let Some(mut archived) = db::archive::fetch(&mut *conn, &entry.id).await? else {
        db::archive::insert(conn, &from_live(entry)).await?;
        return Ok(());
    };

    archived.name = entry.name.clone();
    archived.search_tokens = normalize(&entry.name);
    archived.minister = entry.minister.clone();
    if patch.link.is_some() {
        archived.link = entry.link.clone();
    }
    if patch.letter.is_some() {
        archived.letter = entry.letter.clone();
    }
    if patch.cifra.is_some() {
        archived.cifra = entry.cifra.clone();
    }
    if patch.spotify.is_some() {
        archived.spotify = entry.spotify.clone();
    }
    db::archive::update(conn, &archived).await?;
    Ok(())
}

/// Paging and free-text filter for the history listing.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ArchiveQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct Archive {
    pool: SqlitePool,
}

impl Archive {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn search(&self, query: &ArchiveQuery) -> Result<ArchivePage> {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 || limit < 1 {
            return Err(Error::validation("page and limit must be greater than 0"));
        }
        let tokens = query.search.as_deref().map(normalize).unwrap_or_default();
        let offset = i64::from(page - 1) * i64::from(limit);
        let (total, results) =
            db::archive::search(&self.pool, &tokens, offset, i64::from(limit)).await?;
        Ok(ArchivePage {
            page,
            limit,
            total,
            results,
        })
    }

    pub async fn get(&self, id: &str) -> Result<ArchiveEntry> {
        let mut conn = self.pool.acquire().await?;
        db::archive::fetch(&mut conn, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("archived song {id}")))
    }

    /// Add a song straight to the history under a fresh id.
    pub async fn add(&self, draft: &ArchiveDraft) -> Result<ArchiveEntry> {
        let name = required_name(&draft.name)?;
        let entry = ArchiveEntry {
            id: Uuid::new_v4().to_string(),
            search_tokens: normalize(&name),
            name,
            link: canonicalize(draft.link.as_deref()),
            letter: non_empty(draft.letter.clone()),
            cifra: non_empty(draft.cifra.clone()),
            spotify: non_empty(draft.spotify.clone()),
            minister: non_empty(draft.minister.clone()),
            created_by: None,
            created_at: Utc::now(),
        };
        let mut conn = self.pool.acquire().await?;
        db::archive::insert(&mut conn, &entry).await?;
        info!(id = %entry.id, "song added to history");
        Ok(entry)
    }

    /// Replace the curated fields of an archived song. The minister is only
    /// changed when the draft names one.
    pub async fn update(&self, id: &str, draft: &ArchiveDraft) -> Result<ArchiveEntry> {
        let name = required_name(&draft.name)?;
        let mut conn = self.pool.acquire().await?;
        let mut entry = db::archive::fetch(&mut conn, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("archived song {id}")))?;

        entry.search_tokens = normalize(&name);
        entry.name = name;
        entry.link = canonicalize(draft.link.as_deref());
        entry.letter = non_empty(draft.letter.clone());
        entry.cifra = non_empty(draft.cifra.clone());
        entry.spotify = non_empty(draft.spotify.clone());
        if let Some(minister) = non_empty(draft.minister.clone()) {
            entry.minister = Some(minister);
        }
        db::archive::update(&mut conn, &entry).await?;
        Ok(entry)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if db::archive::delete(&mut conn, id).await? == 0 {
            return Err(Error::not_found(format!("archived song {id}")));
        }
        info!(id, "song removed from history");
        Ok(())
    }
}
