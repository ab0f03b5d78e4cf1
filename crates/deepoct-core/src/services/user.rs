//! Profile and account management.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::api::ApiClient;
use crate::models::{UpdateProfileRequest, UserProfile};

use super::Outcome;

/// Minimum accepted password length, matching the backend's rule.
const MIN_PASSWORD_LEN: usize = 6;

pub struct UserService {
    api: Arc<ApiClient>,
}

impl UserService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the profile and opportunistically cache it for offline
    /// fallback. A cache write failure does not fail the fetch.
    pub async fn get_profile(&self) -> Outcome<UserProfile> {
        let profile = match self.api.fetch_profile().await {
            Ok(profile) => profile,
            Err(err) => return Outcome::fail(err.user_message()),
        };

        if let Err(err) = self.api.store().set_user_data(&profile).await {
            warn!(error = %err, "failed to cache profile");
        }

        Outcome::ok("Profile loaded successfully", profile)
    }

    /// Last cached profile, possibly stale. `None` when nothing is cached
    /// or the cache is unreadable.
    pub async fn cached_profile(&self) -> Option<UserProfile> {
        self.api.store().user_data().await.unwrap_or_default()
    }

    pub async fn update_profile(&self, changes: UpdateProfileRequest) -> Outcome {
        let response = match self.api.update_profile(&changes).await {
            Ok(response) => response,
            Err(err) => return Outcome::fail(err.user_message()),
        };

        // Keep the cached copy in step with the accepted changes
        match self.api.store().user_data().await {
            Ok(Some(mut profile)) => {
                changes.apply_to(&mut profile);
                if let Err(err) = self.api.store().set_user_data(&profile).await {
                    warn!(error = %err, "failed to update cached profile");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to read cached profile"),
        }

        Outcome::ok_empty(response.msg)
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Outcome {
        if current_password.is_empty() || new_password.is_empty() {
            return Outcome::fail("Please fill in all fields");
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Outcome::fail("New password must be at least 6 characters");
        }

        match self.api.change_password(current_password, new_password).await {
            Ok(response) => Outcome::ok_empty(response.msg),
            Err(err) => Outcome::fail(err.user_message()),
        }
    }

    /// Delete the account, then destroy all local credentials and cache.
    pub async fn delete_account(&self, password: &str) -> Outcome {
        if password.is_empty() {
            return Outcome::fail("Please enter your password");
        }

        let response = match self.api.delete_account(password).await {
            Ok(response) => response,
            Err(err) => return Outcome::fail(err.user_message()),
        };

        if let Err(err) = self.api.store().clear_all().await {
            warn!(error = %err, "failed to clear credentials after account deletion");
        }

        Outcome::ok_empty(response.msg)
    }

    pub async fn upload_avatar(&self, path: &Path) -> Outcome {
        let image = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "could not read avatar file");
                return Outcome::fail("Could not read image file");
            }
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar.jpg".to_string());

        match self
            .api
            .upload_avatar(image, &file_name, mime_for_path(path))
            .await
        {
            Ok(response) => Outcome::ok_empty(response.msg),
            Err(err) => Outcome::fail(err.user_message()),
        }
    }
}

/// Content type by extension; the backend only accepts JPEG and PNG so
/// anything else is sent as JPEG and rejected server-side.
pub(crate) fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("scan.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("scan.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("scan.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "image/jpeg");
    }
}
