use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub mobile_number: String,
    pub date_of_birth: String,
}

/// Access/refresh pair returned by login and token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// Generic `{ msg }` acknowledgment used by most mutating endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfirmResponse {
    pub reset_token: String,
    #[serde(default)]
    pub token_type: String,
    pub msg: String,
}

/// Final step of the forgot-password flow. The reset token from OTP
/// confirmation travels in the body, not the Authorization header.
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordChange {
    pub reset_token: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_pair() {
        let json = r#"{"access_token": "A1", "refresh_token": "R1", "token_type": "bearer"}"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.access_token, "A1");
        assert_eq!(pair.refresh_token, "R1");
        assert_eq!(pair.token_type, "bearer");
    }

    #[test]
    fn test_token_type_is_optional() {
        let json = r#"{"access_token": "A1", "refresh_token": "R1"}"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert!(pair.token_type.is_empty());
    }
}
