//! Error types for the gate's request path.

use axum::http::StatusCode;
use thiserror::Error;

/// Faults that turn into a 500 at the outermost boundary.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid redirect target: {0}")]
    InvalidRedirect(String),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl GateError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub type GateResult<T> = Result<T, GateError>;
