//! Authentication flows: login, registration, and password reset.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::events::SessionEvent;
use crate::models::{LoginRequest, RegisterRequest, ResetPasswordChange};

use super::Outcome;

/// Minimum accepted password length, matching the backend's rule.
const MIN_PASSWORD_LEN: usize = 6;

/// Length of the emailed one-time password.
const OTP_LEN: usize = 6;

pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> Outcome {
        if email.is_empty() || password.is_empty() {
            return Outcome::fail("Email and password are required");
        }
        if !is_valid_email(email) {
            return Outcome::fail("Please enter a valid email");
        }

        let credentials = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let pair = match self.api.login(&credentials).await {
            Ok(pair) => pair,
            Err(err) => return Outcome::fail(err.user_message()),
        };

        let store = self.api.store();
        if let Err(err) = store.set_access_token(&pair.access_token).await {
            warn!(error = %err, "failed to persist access token");
            return Outcome::fail("An unexpected error occurred");
        }
        if let Err(err) = store.set_refresh_token(&pair.refresh_token).await {
            warn!(error = %err, "failed to persist refresh token");
            return Outcome::fail("An unexpected error occurred");
        }

        debug!("login succeeded, token pair stored");
        Outcome::ok_empty("Login successful")
    }

    pub async fn register(&self, user: RegisterRequest) -> Outcome {
        if user.email.is_empty() || user.password.is_empty() || user.full_name.is_empty() {
            return Outcome::fail("Please fill in all required fields");
        }
        if !is_valid_email(&user.email) {
            return Outcome::fail("Please enter a valid email");
        }
        if user.password.len() < MIN_PASSWORD_LEN {
            return Outcome::fail("Password must be at least 6 characters");
        }

        match self.api.register(&user).await {
            Ok(response) => Outcome::ok_empty(response.msg),
            Err(err) => Outcome::fail(err.user_message()),
        }
    }

    /// Start the forgot-password flow by emailing an OTP.
    pub async fn request_password_reset(&self, email: &str) -> Outcome {
        if email.is_empty() || !is_valid_email(email) {
            return Outcome::fail("Please enter a valid email");
        }
        match self.api.request_password_reset(email).await {
            Ok(response) => Outcome::ok_empty(response.msg),
            Err(err) => Outcome::fail(err.user_message()),
        }
    }

    pub async fn resend_otp(&self, email: &str) -> Outcome {
        if email.is_empty() || !is_valid_email(email) {
            return Outcome::fail("Invalid email address");
        }
        match self.api.request_password_reset(email).await {
            Ok(response) => Outcome::ok_empty(response.msg),
            Err(err) => Outcome::fail(err.user_message()),
        }
    }

    /// Exchange the OTP for a reset token; the token rides in the outcome
    /// data for the final password change step.
    pub async fn confirm_otp(&self, otp: &str) -> Outcome<String> {
        if otp.len() != OTP_LEN || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Outcome::fail("Please enter a valid 6-digit OTP");
        }
        match self.api.confirm_otp(otp).await {
            Ok(response) => Outcome::ok(response.msg, response.reset_token),
            Err(err) => Outcome::fail(err.user_message()),
        }
    }

    pub async fn complete_password_reset(&self, reset_token: &str, new_password: &str) -> Outcome {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Outcome::fail("Password must be at least 6 characters");
        }
        let change = ResetPasswordChange {
            reset_token: reset_token.to_string(),
            new_password: new_password.to_string(),
        };
        match self.api.complete_password_reset(&change).await {
            Ok(response) => Outcome::ok_empty(response.msg),
            Err(err) => Outcome::fail(err.user_message()),
        }
    }

    /// Deliberate logout: clear everything, then tell the front-end.
    pub async fn logout(&self) {
        if let Err(err) = self.api.store().clear_all().await {
            warn!(error = %err, "failed to clear credentials on logout");
        }
        self.api.events().emit(SessionEvent::Logout);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.api.store().is_authenticated().await
    }
}

/// Shape check only - one `@`, something before it, a dot inside the
/// domain, no whitespace. The server does the real validation.
fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("doctor@example.com"));
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.domain.org"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@domain."));
    }
}
