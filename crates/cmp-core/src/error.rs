//! Errors that can occur when using this SDK

use cmp_state::RepositoryError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors from performing remote consent lookups.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Received error message from server: [{}] {}", .status, .message)]
    ResponseContent { status: StatusCode, message: String },
}

/// Failure to assemble a loadable message-page URL.
///
/// This is fatal for session start: a partially built URL is never loaded.
#[derive(Debug, Error)]
#[error("Invalid message page URL: {0}")]
pub struct UrlError(#[from] url::ParseError);
