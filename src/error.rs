//! Error taxonomy shared by the store, the archive and the schedule services.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or empty. Nothing was written.
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// The database could not be reached or rejected the statement.
    #[error("storage failure: {0}")]
    Dependency(sqlx::Error),
    /// A stored document no longer decodes.
    #[error("malformed stored document: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("row".into()),
            other => Error::Dependency(other),
        }
    }
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
