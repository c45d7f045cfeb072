//! Error taxonomy shared by the store, the coordinator and the HTTP layer.
//!
//! Every failure that reaches a client is one of these variants. The HTTP
//! layer renders the `Display` text as the response body, so messages are
//! written for humans, not for machine parsing.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A table, row or database that the command addresses does not exist.
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// An insert did not carry every column declared by the table.
    #[error("missing column '{column}' for table {table}")]
    MissingColumn { table: String, column: String },

    /// A role-gated command reached a node with the wrong role.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A peer could not be reached, or answered with a non-success status.
    #[error("transport failure: {0}")]
    TransportFailure(String),
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
            StoreError::MissingColumn { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            StoreError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            StoreError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::TransportFailure(err.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
