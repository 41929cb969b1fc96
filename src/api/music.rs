//! `/musicList`: the live weekly playlist.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::error::ApiResult;
use super::AppState;
use crate::error::Error;
use crate::model::{NewPlaylistEntry, PlaylistEntry, PlaylistUpdate};
use crate::music::{self, Added};

/// Header carrying the id of the calling team member.
pub const USER_ID_HEADER: &str = "x-user-id";

fn caller_id(headers: &HeaderMap) -> Result<String, Error> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("{USER_ID_HEADER} header is required")))
}

/// GET /musicList
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PlaylistEntry>>> {
    Ok(Json(music::list_playlist(&state.playlist).await?))
}

/// POST /musicList
pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewPlaylistEntry>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Added>)> {
    let Json(entry) = payload?;
    let caller = caller_id(&headers)?;
    let added = music::add_to_playlist(&state.playlist, &caller, entry).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// PUT /musicList/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PlaylistUpdate>, JsonRejection>,
) -> ApiResult<Json<PlaylistEntry>> {
    let Json(patch) = payload?;
    Ok(Json(music::update_playlist(&state.playlist, &id, &patch).await?))
}

/// DELETE /musicList/:id. Deleting an absent song succeeds with `deleted: false`.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = music::delete_from_playlist(&state.playlist, &id).await?;
    Ok(Json(json!({ "id": id, "deleted": deleted })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/musicList", get(list).post(add))
        .route("/musicList/:id", put(update).delete(delete))
}
