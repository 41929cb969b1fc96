//! The live weekly playlist and its dense 1..N ordering.
//!
//! Every mutation runs inside one SQLite transaction while holding the
//! playlist's write lock, so a re-rank or compaction pass never interleaves
//! with another writer. Callers that need to touch other tables in the same
//! unit of work (the archive mirror, the weekly reset gate) go through
//! [`Playlist::exclusive`] and the `*_in` functions.

use std::sync::Arc;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db;
use crate::error::{Error, Result};
use crate::links::canonicalize;
use crate::model::{NewPlaylistEntry, PlaylistEntry, PlaylistUpdate};

#[derive(Clone)]
pub struct Playlist {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

/// Write lock plus open transaction; dropping it without committing rolls back.
pub struct Exclusive {
    pub tx: Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

impl Exclusive {
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl Playlist {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Take the write lock and open a transaction.
    pub async fn exclusive(&self) -> Result<Exclusive> {
        let guard = self.write_lock.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(Exclusive { tx, _guard: guard })
    }

    /// Add an entry after the current last one (rank = max + 1).
    pub async fn append(&self, entry: NewPlaylistEntry) -> Result<PlaylistEntry> {
        let mut ex = self.exclusive().await?;
        let stored = append_in(&mut ex.tx, entry).await?;
        ex.commit().await?;
        Ok(stored)
    }

    /// Apply `patch` to entry `id`, moving it when the requested rank differs.
    pub async fn update(&self, id: &str, patch: &PlaylistUpdate) -> Result<PlaylistEntry> {
        let mut ex = self.exclusive().await?;
        let stored = update_in(&mut ex.tx, id, patch).await?;
        ex.commit().await?;
        Ok(stored)
    }

    /// Remove entry `id` (absent is fine) and close the gap it leaves.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut ex = self.exclusive().await?;
        let removed = delete_in(&mut ex.tx, id).await?;
        ex.commit().await?;
        Ok(removed)
    }

    pub async fn list_ordered(&self) -> Result<Vec<PlaylistEntry>> {
        let mut conn = self.pool.acquire().await?;
        db::playlist::list_ordered(&mut conn).await
    }

    /// Remove every entry in one statement. Returns how many were removed.
    pub async fn clear_all(&self) -> Result<u64> {
        let mut ex = self.exclusive().await?;
        let removed = clear_in(&mut ex.tx).await?;
        ex.commit().await?;
        Ok(removed)
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("song name is required"));
    }
    Ok(trimmed.to_string())
}

/// Zero-based slot for a requested 1-based rank among `len` entries.
/// Out-of-range requests are clamped to the first or last slot.
fn target_index(requested: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (requested.clamp(1, len as i64) - 1) as usize
}

/// Write ranks 1..N following the order of `ordered`.
async fn write_ranks(conn: &mut SqliteConnection, ordered: &[PlaylistEntry]) -> Result<()> {
    for (idx, entry) in ordered.iter().enumerate() {
        let rank = idx as i64 + 1;
        if entry.rank != rank {
            db::playlist::set_rank(&mut *conn, &entry.id, rank).await?;
        }
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn append_in(conn: &mut SqliteConnection, entry: NewPlaylistEntry) -> Result<PlaylistEntry> {
    let name = required_name(&entry.name)?;
    let id = match non_empty(entry.id) {
        Some(id) => {
            if db::playlist::fetch(&mut *conn, &id).await?.is_some() {
                return Err(Error::Conflict(format!("playlist entry {id} already exists")));
            }
            id
        }
        None => Uuid::new_v4().to_string(),
    };

    let rank = db::playlist::max_rank(&mut *conn).await? + 1;
    let stored = PlaylistEntry {
        id,
        name,
        link: canonicalize(entry.link.as_deref()),
        letter: non_empty(entry.letter),
        cifra: non_empty(entry.cifra),
        spotify: non_empty(entry.spotify),
        minister: non_empty(entry.minister),
        rank,
        created_by: non_empty(entry.created_by),
    };
    db::playlist::insert(&mut *conn, &stored).await?;
    info!(id = %stored.id, rank, "playlist entry appended");
    Ok(stored)
}

/// The entry as it looks once `patch` is applied; rank untouched.
pub(crate) fn apply_patch(existing: &PlaylistEntry, patch: &PlaylistUpdate, name: String) -> PlaylistEntry {
    let keep_or = |current: &Option<String>, supplied: &Option<String>| match supplied {
        None => current.clone(),
        Some(v) => non_empty(Some(v.clone())),
    };
    PlaylistEntry {
        id: existing.id.clone(),
        name,
        link: match &patch.link {
            None => existing.link.clone(),
            Some(raw) => canonicalize(Some(raw)),
        },
        letter: keep_or(&existing.letter, &patch.letter),
        cifra: keep_or(&existing.cifra, &patch.cifra),
        spotify: keep_or(&existing.spotify, &patch.spotify),
        minister: non_empty(patch.minister.clone()).or_else(|| existing.minister.clone()),
        rank: existing.rank,
        created_by: existing.created_by.clone(),
    }
}

#[instrument(skip_all)]
pub async fn update_in(
    conn: &mut SqliteConnection,
    id: &str,
    patch: &PlaylistUpdate,
) -> Result<PlaylistEntry> {
    let name = required_name(&patch.name)?;
    let existing = db::playlist::fetch(&mut *conn, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("playlist entry {id}")))?;

    let mut updated = apply_patch(&existing, patch, name);
    db::playlist::update_content(&mut *conn, &updated).await?;

    if let Some(requested) = patch.rank {
        if requested != existing.rank {
            updated.rank = move_to(&mut *conn, id, requested).await?;
        }
    }
    Ok(updated)
}

/// Take `id` out of the ordered sequence, put it back at `requested` and
/// renumber everything. Returns the rank the entry ended up with.
async fn move_to(conn: &mut SqliteConnection, id: &str, requested: i64) -> Result<i64> {
    let mut ordered = db::playlist::list_ordered(&mut *conn).await?;
    let from = ordered
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| Error::not_found(format!("playlist entry {id}")))?;
    let moved = ordered.remove(from);
    let to = target_index(requested, ordered.len() + 1);
    ordered.insert(to, moved);
    write_ranks(&mut *conn, &ordered).await?;
    debug!(id, from = from + 1, to = to + 1, requested, "playlist entry moved");
    Ok(to as i64 + 1)
}

#[instrument(skip_all)]
pub async fn delete_in(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
    let removed = db::playlist::delete(&mut *conn, id).await? > 0;
    compact(&mut *conn).await?;
    if removed {
        info!(id, "playlist entry removed");
    }
    Ok(removed)
}

/// Renumber the remaining entries 1..N in their current order.
pub async fn compact(conn: &mut SqliteConnection) -> Result<()> {
    let ordered = db::playlist::list_ordered(&mut *conn).await?;
    write_ranks(conn, &ordered).await
}

#[instrument(skip_all)]
pub async fn clear_in(conn: &mut SqliteConnection) -> Result<u64> {
    let removed = db::playlist::delete_all(conn).await?;
    info!(removed, "playlist cleared");
    Ok(removed)
}
