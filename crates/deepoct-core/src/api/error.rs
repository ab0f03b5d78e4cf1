use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by the request pipeline.
///
/// `AuthExpired` is only produced after the pipeline has already cleared
/// the credential store and emitted a session event; callers never have to
/// distinguish "expired" from "refresh failed" themselves.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot connect to server. Please check your internet connection.")]
    Network(#[source] reqwest::Error),

    #[error("Session expired - please log in again")]
    AuthExpired,

    #[error("{}", .detail.as_deref().unwrap_or("An error occurred. Please try again."))]
    Validation { status: u16, detail: Option<String> },

    #[error("Server error ({status})")]
    Server { status: u16, detail: Option<String> },

    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Error body envelope used by the backend for every non-2xx response.
#[derive(Deserialize)]
struct ErrorEnvelope {
    detail: Option<String>,
}

impl ApiError {
    /// Classify a non-2xx response. 401 lands in `Validation` here; the
    /// pipeline intercepts session 401s before classification, so only
    /// public endpoints (e.g. a wrong-password login) reach this with 401.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.detail);

        match status.as_u16() {
            400..=499 => ApiError::Validation {
                status: status.as_u16(),
                detail,
            },
            500..=599 => ApiError::Server {
                status: status.as_u16(),
                detail,
            },
            other => ApiError::Unexpected(format!("unexpected status {}", other)),
        }
    }

    /// Connection-level failure: DNS, refused connection, timeout. No HTTP
    /// response was received, so no refresh is attempted for these.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        ApiError::Network(err)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message for dialogs, preferring the server-supplied
    /// `detail` text where present.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Cannot connect to server. Please check your internet connection.".to_string()
            }
            ApiError::AuthExpired => "Authentication required. Please login again.".to_string(),
            ApiError::Validation {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Validation { .. } => "An error occurred. Please try again.".to_string(),
            ApiError::Server { .. } => "Server error. Please try again later.".to_string(),
            ApiError::Storage(_) | ApiError::Unexpected(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }
}
