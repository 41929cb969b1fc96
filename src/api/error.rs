//! Error responses: `{"error": {"code", "message"}}` with a matching status.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] Error),

    /// Body or query string that does not decode (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A job or collaborator failed; may wrap a domain error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn classify(err: &Error) -> (StatusCode, &'static str) {
    match err {
        Error::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        Error::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        Error::Dependency(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DEPENDENCY"),
        Error::Malformed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Domain(err) => {
                let (status, code) = classify(err);
                (status, code, err.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Other(err) => match err.downcast_ref::<Error>() {
                Some(domain) => {
                    let (status, code) = classify(domain);
                    (status, code, domain.to_string())
                }
                None => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", format!("{err:#}")),
            },
        };

        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
