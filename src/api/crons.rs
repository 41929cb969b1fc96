//! `/crons/*`: run a periodic job now.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiResult;
use super::AppState;
use crate::gate::ResetOutcome;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClearParams {
    pub force: bool,
}

/// GET /crons/birthday
pub async fn birthday(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let today = state.jobs.today(Utc::now());
    let celebrated = state.jobs.run_birthday_greetings(today).await?;
    Ok(Json(json!({ "date": today, "celebrated": celebrated })))
}

/// GET /crons/music
pub async fn music(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let sent = state.jobs.run_music_reminder().await?;
    Ok(Json(json!({ "sent": sent })))
}

/// GET /crons/delete-musics-weekly[?force=true]
pub async fn delete_musics_weekly(
    State(state): State<AppState>,
    params: Result<Query<ClearParams>, QueryRejection>,
) -> ApiResult<Json<ResetOutcome>> {
    let Query(params) = params?;
    let outcome = state
        .jobs
        .run_weekly_playlist_clear(Utc::now(), params.force)
        .await?;
    Ok(Json(outcome))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/birthday", get(birthday))
        .route("/music", get(music))
        .route("/delete-musics-weekly", get(delete_musics_weekly))
}
