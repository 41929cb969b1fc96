//! `/notification` and `/warnings`: the two front-page banners.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use super::error::ApiResult;
use super::AppState;
use crate::db;
use crate::error::{Error, Result};
use crate::model::{Notice, NoticeKind};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoticeInput {
    pub text: String,
}

async fn current(state: &AppState, kind: NoticeKind) -> Result<Notice> {
    db::notices::get(&state.pool, kind)
        .await?
        .ok_or_else(|| Error::not_found(kind.as_str()))
}

async fn replace(state: &AppState, kind: NoticeKind, text: &str) -> Result<Notice> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::validation(format!("{} text is required", kind.as_str())));
    }
    let notice = db::notices::set(&state.pool, kind, text).await?;
    info!(kind = kind.as_str(), "notice updated");
    Ok(notice)
}

pub async fn get_notification(State(state): State<AppState>) -> ApiResult<Json<Notice>> {
    Ok(Json(current(&state, NoticeKind::Notification).await?))
}

pub async fn set_notification(
    State(state): State<AppState>,
    payload: Result<Json<NoticeInput>, JsonRejection>,
) -> ApiResult<Json<Notice>> {
    let Json(input) = payload?;
    Ok(Json(replace(&state, NoticeKind::Notification, &input.text).await?))
}

pub async fn get_warning(State(state): State<AppState>) -> ApiResult<Json<Notice>> {
    Ok(Json(current(&state, NoticeKind::Warning).await?))
}

pub async fn set_warning(
    State(state): State<AppState>,
    payload: Result<Json<NoticeInput>, JsonRejection>,
) -> ApiResult<Json<Notice>> {
    let Json(input) = payload?;
    Ok(Json(replace(&state, NoticeKind::Warning, &input.text).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notification", get(get_notification).post(set_notification))
        .route("/warnings", get(get_warning).post(set_warning))
}
