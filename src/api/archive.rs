//! `/allMusicLinks`: the permanent song history.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use super::error::ApiResult;
use super::AppState;
use crate::archive::ArchiveQuery;
use crate::model::{ArchiveDraft, ArchiveEntry, ArchivePage};

/// GET /allMusicLinks?page=&limit=&search=
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<ArchiveQuery>, QueryRejection>,
) -> ApiResult<Json<ArchivePage>> {
    let Query(query) = query?;
    Ok(Json(state.archive.search(&query).await?))
}

/// POST /allMusicLinks
pub async fn add(
    State(state): State<AppState>,
    payload: Result<Json<ArchiveDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ArchiveEntry>)> {
    let Json(draft) = payload?;
    let entry = state.archive.add(&draft).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /allMusicLinks/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ArchiveDraft>, JsonRejection>,
) -> ApiResult<Json<ArchiveEntry>> {
    let Json(draft) = payload?;
    Ok(Json(state.archive.update(&id, &draft).await?))
}

/// DELETE /allMusicLinks/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.archive.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/allMusicLinks", get(search).post(add))
        .route("/allMusicLinks/:id", put(update).delete(delete))
}
