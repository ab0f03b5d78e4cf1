//! Client configuration.
//!
//! Holds the backend base URL and request timeouts, plus the endpoint
//! path table. The base URL can be overridden with the `DEEPOCT_API_URL`
//! environment variable for local backend development.

use std::time::Duration;

/// Production backend domain.
pub const DEFAULT_BASE_URL: &str = "https://deepoct.id.vn";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for the prediction endpoint in seconds.
/// ML inference on the server can take well over the default timeout.
const PREDICT_TIMEOUT_SECS: u64 = 60;

/// Environment variable overriding the backend base URL.
const BASE_URL_ENV: &str = "DEEPOCT_API_URL";

/// Endpoint paths, relative to the base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const RESET_PASSWORD: &str = "/reset-password";
    pub const RESET_PASSWORD_CONFIRM: &str = "/reset-password/otp-confirm";
    pub const RESET_PASSWORD_CHANGE: &str = "/reset-password/change-password";
    pub const REFRESH_TOKEN: &str = "/refresh-token";

    pub const PROFILE: &str = "/profile";
    pub const CHANGE_PASSWORD: &str = "/change-password";
    pub const ACCOUNT: &str = "/account";
    pub const AVATAR: &str = "/avatar";

    pub const PREDICT: &str = "/predictions/predict";
    pub const PREDICTION_HISTORY: &str = "/predictions/history";
    pub const PREDICTIONS: &str = "/predictions";
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub predict_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            predict_timeout: Duration::from_secs(PREDICT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Build a config, taking the base URL from `DEEPOCT_API_URL` when set.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(url.trim()),
            _ => Self::default(),
        }
    }

    /// Build a config pointing at a specific backend, e.g. a local server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        // Trailing slashes would double up when joined with endpoint paths
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            ..Self::default()
        }
    }
}
