//! Playlist operations as the HTTP layer sees them: identity resolution,
//! the ordered store and the archive mirror committed as one unit.

use serde::Serialize;
use tracing::{info, instrument};

use crate::archive;
use crate::db;
use crate::error::{Error, Result};
use crate::model::{Identity, NewPlaylistEntry, PlaylistEntry, PlaylistUpdate, Role};
use crate::playlist::{self, non_empty, Playlist};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Added {
    pub id: String,
    pub order: i64,
}

/// Who ministers a song added by `caller`: ministers always lead their own
/// submissions, anyone else has to name the minister.
pub fn resolve_minister(caller: &Identity, requested: Option<String>) -> Result<String> {
    if caller.has_role(Role::Minister) {
        return Ok(caller.display_name().to_string());
    }
    non_empty(requested).ok_or_else(|| Error::validation("minister is required for this song"))
}

#[instrument(skip_all)]
pub async fn add_to_playlist(
    playlist: &Playlist,
    caller_id: &str,
    mut entry: NewPlaylistEntry,
) -> Result<Added> {
    if entry.name.trim().is_empty() {
        return Err(Error::validation("song name is required"));
    }
    let caller = db::users::fetch_identity(playlist.pool(), caller_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("user {caller_id}")))?;
    entry.minister = Some(resolve_minister(&caller, entry.minister.take())?);
    entry.created_by = Some(caller.id.clone());

    let mut ex = playlist.exclusive().await?;
    let stored = playlist::append_in(&mut ex.tx, entry).await?;
    let archived = archive::mirror_on_add(&mut ex.tx, &stored).await?;
    ex.commit().await?;

    info!(id = %stored.id, order = stored.rank, archived, "song added to playlist");
    Ok(Added {
        id: stored.id,
        order: stored.rank,
    })
}

#[instrument(skip_all)]
pub async fn update_playlist(
    playlist: &Playlist,
    id: &str,
    patch: &PlaylistUpdate,
) -> Result<PlaylistEntry> {
    if id.trim().is_empty() {
        return Err(Error::validation("song id is required"));
    }
    let mut ex = playlist.exclusive().await?;
    let updated = playlist::update_in(&mut ex.tx, id, patch).await?;
    archive::mirror_on_update(&mut ex.tx, &updated, patch).await?;
    ex.commit().await?;
    Ok(updated)
}

pub async fn delete_from_playlist(playlist: &Playlist, id: &str) -> Result<bool> {
    if id.trim().is_empty() {
        return Err(Error::validation("song id is required"));
    }
    playlist.delete(id).await
}

pub async fn list_playlist(playlist: &Playlist) -> Result<Vec<PlaylistEntry>> {
    playlist.list_ordered().await
}
