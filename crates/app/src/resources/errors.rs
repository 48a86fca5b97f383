//! Resource service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceServiceError {
    #[error("resource not found")]
    NotFound,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response with status {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("invalid response body")]
    Decode(#[source] serde_json::Error),

    #[error("api url cannot have path segments")]
    InvalidBaseUrl,
}
