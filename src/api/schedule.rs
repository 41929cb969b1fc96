//! `/schedule`: monthly rehearsal schedule and the next-Sunday read.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::error::ApiResult;
use super::AppState;
use crate::error::Error;
use crate::model::{Assignments, ServiceDay, UpcomingSchedule};

#[derive(Debug, Deserialize)]
pub struct DayInput {
    pub date: NaiveDate,
    pub assignments: Option<Assignments>,
}

/// GET /schedule/next-sunday
pub async fn next_sunday(State(state): State<AppState>) -> ApiResult<Json<UpcomingSchedule>> {
    Ok(Json(state.schedules.upcoming(Utc::now()).await?))
}

/// GET /schedule/:month (`MM-YYYY`)
pub async fn month(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> ApiResult<Json<Vec<ServiceDay>>> {
    Ok(Json(state.schedules.month(&month).await?))
}

/// POST /schedule
pub async fn upsert(
    State(state): State<AppState>,
    payload: Result<Json<DayInput>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(input) = payload?;
    let assignments = input
        .assignments
        .ok_or_else(|| Error::validation("assignments are required"))?;
    state.schedules.upsert_day(input.date, assignments).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    // The static segment wins over the `:month` capture.
    Router::new()
        .route("/schedule", post(upsert))
        .route("/schedule/next-sunday", get(next_sunday))
        .route("/schedule/:month", get(month))
}
