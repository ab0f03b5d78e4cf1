//! Caller-facing operations.
//!
//! Services validate input, call the API pipeline, keep the credential
//! store in sync, and fold every error into a uniform [`Outcome`] so
//! front-ends render a message instead of handling error types.

pub mod auth;
pub mod prediction;
pub mod settings;
pub mod user;

pub use auth::AuthService;
pub use prediction::PredictionService;
pub use settings::{Language, SettingsService};
pub use user::UserService;

/// Uniform result handed to front-ends: a success flag, a human-readable
/// message, and the payload when there is one. Services never return `Err`.
#[derive(Debug, Clone)]
pub struct Outcome<T = ()> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}
