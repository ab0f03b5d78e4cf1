use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub date_of_birth: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

impl UpdateProfileRequest {
    /// Apply the accepted changes to a cached profile copy.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(ref full_name) = self.full_name {
            profile.full_name = full_name.clone();
        }
        if let Some(ref mobile_number) = self.mobile_number {
            profile.mobile_number = mobile_number.clone();
        }
        if let Some(ref date_of_birth) = self.date_of_birth {
            profile.date_of_birth = date_of_birth.clone();
        }
    }
}

/// In-app password change for an authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Account deletion requires password confirmation in the body.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{
            "id": 12,
            "email": "eye@example.com",
            "full_name": "Eye Doctor",
            "mobile_number": "0123456789",
            "date_of_birth": "1990-05-04",
            "is_active": true,
            "is_verified": false,
            "created_at": "2025-01-10T08:30:00Z",
            "updated_at": "2025-02-01T10:00:00Z"
        }"#;

        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, 12);
        assert_eq!(profile.full_name, "Eye Doctor");
        assert!(profile.is_active);
        assert!(!profile.is_verified);
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        let req = UpdateProfileRequest {
            full_name: Some("New Name".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"full_name":"New Name"}"#);
    }

    #[test]
    fn test_apply_to_merges_only_present_fields() {
        let json = r#"{
            "id": 1, "email": "a@b.co", "full_name": "Old",
            "mobile_number": "111", "date_of_birth": "1990-01-01",
            "is_active": true, "is_verified": true,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;
        let mut profile: UserProfile = serde_json::from_str(json).unwrap();

        let req = UpdateProfileRequest {
            mobile_number: Some("222".to_string()),
            ..Default::default()
        };
        req.apply_to(&mut profile);

        assert_eq!(profile.full_name, "Old");
        assert_eq!(profile.mobile_number, "222");
    }
}
