//! API client for the DeepOCT inference backend.
//!
//! One `ApiClient` wraps a shared `reqwest::Client`, the credential store,
//! and the session event channel. Every authenticated call goes through
//! the same pipeline: attach the stored bearer token, send, and on a 401
//! refresh the token pair once and retry once. Concurrent 401s coalesce on
//! a single in-flight refresh; whichever request acquires the refresh gate
//! first performs the rotation and the rest reuse its result. When refresh
//! is impossible the pipeline clears the credential store, emits
//! `TokenExpired`, and fails the caller with `AuthExpired`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{multipart, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{endpoints, ApiConfig};
use crate::events::{SessionEvent, SessionEvents};
use crate::models::{
    ChangePasswordRequest, DeleteAccountRequest, HistoryPage, LoginRequest, MessageResponse,
    OtpConfirmResponse, PredictionResult, RegisterRequest, ResetPasswordChange, TokenPair,
    UpdateProfileRequest, UserProfile,
};
use crate::storage::CredentialStore;

use super::ApiError;

// ============================================================================
// Request descriptor
// ============================================================================

/// Whether a request participates in the bearer/refresh pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    /// Bearer token from the credential store; 401 triggers refresh.
    Session,
    /// No token attached and no refresh; a 401 here means bad input
    /// (e.g. wrong login credentials) and classifies as `Validation`.
    Public,
}

/// Owned multipart field, kept as bytes so the retry after a refresh can
/// rebuild the form.
struct MultipartField {
    name: &'static str,
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
}

enum Payload {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartField>),
}

/// Immutable description of one outbound request. The refresh retry sends
/// the same descriptor a second time; there is no mutable retry flag, and
/// a request is never sent more than twice.
struct RequestSpec {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    payload: Payload,
    timeout: Option<Duration>,
    auth: AuthMode,
}

impl RequestSpec {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            payload: Payload::Empty,
            timeout: None,
            auth: AuthMode::Session,
        }
    }

    fn public(mut self) -> Self {
        self.auth = AuthMode::Public;
        self
    }

    fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::Unexpected(format!("failed to encode request body: {}", err)))?;
        self.payload = Payload::Json(value);
        Ok(self)
    }

    fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.payload = Payload::Multipart(fields);
        self
    }

    fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the DeepOCT backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and clones share the same refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    store: CredentialStore,
    events: SessionEvents,
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    /// Create a client over an injected credential store and event channel.
    /// Construct one instance at application start and share it.
    pub fn new(
        config: ApiConfig,
        store: CredentialStore,
        events: SessionEvents,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::from_transport)?;

        Ok(Self {
            http,
            config,
            store,
            events,
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    async fn dispatch<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T, ApiError> {
        let bearer = match spec.auth {
            AuthMode::Public => None,
            AuthMode::Session => self.session_token().await,
        };

        let response = self.send(&spec, bearer.as_deref()).await?;
        let status = response.status();

        if status != StatusCode::UNAUTHORIZED || spec.auth != AuthMode::Session {
            let body = response.text().await.unwrap_or_default();
            return Self::parse(status, &body);
        }

        debug!(path = %spec.path, "401 on authenticated request, refreshing token");
        let fresh = match self.refresh_session(bearer.as_deref()).await {
            Ok(token) => token,
            Err(err) => return Err(self.expire_session(err).await),
        };

        // Single retry with the refreshed token. Another 401 here means the
        // rotated pair is also rejected; give up without refreshing again.
        let retry = self.send(&spec, Some(&fresh)).await?;
        let status = retry.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(path = %spec.path, "retry after refresh still unauthorized");
            return Err(self.expire_session(ApiError::AuthExpired).await);
        }

        let body = retry.text().await.unwrap_or_default();
        Self::parse(status, &body)
    }

    async fn send(
        &self,
        spec: &RequestSpec,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.config.base_url, spec.path);
        let mut request = self.http.request(spec.method.clone(), &url);

        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = spec.timeout {
            request = request.timeout(timeout);
        }

        request = match &spec.payload {
            Payload::Empty => request,
            Payload::Json(value) => request.json(value),
            Payload::Multipart(fields) => {
                let mut form = multipart::Form::new();
                for field in fields {
                    let part = multipart::Part::bytes(field.bytes.clone())
                        .file_name(field.file_name.clone())
                        .mime_str(&field.mime)
                        .map_err(|err| {
                            ApiError::Unexpected(format!("invalid multipart field: {}", err))
                        })?;
                    form = form.part(field.name, part);
                }
                request.multipart(form)
            }
        };

        request.send().await.map_err(ApiError::from_transport)
    }

    fn parse<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
        if status.is_success() {
            serde_json::from_str(body)
                .map_err(|err| ApiError::Unexpected(format!("invalid response body: {}", err)))
        } else {
            Err(ApiError::from_status(status, body))
        }
    }

    /// Token for an authenticated request. Storage faults fail open to
    /// "no token" so a local persistence problem cannot block the app.
    async fn session_token(&self) -> Option<String> {
        match self.store.access_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "failed to read access token, sending unauthenticated");
                None
            }
        }
    }

    /// Rotate the token pair, coalescing concurrent refresh attempts.
    ///
    /// `stale` is the access token the failed request was sent with. After
    /// acquiring the gate, a waiter that finds a different token stored
    /// knows another request already refreshed and reuses it instead of
    /// spending a second refresh call.
    async fn refresh_session(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.refresh_gate.lock().await;

        if let Ok(Some(current)) = self.store.access_token().await {
            if stale != Some(current.as_str()) {
                debug!("reusing token refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let refresh_token = match self.store.refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return Err(ApiError::AuthExpired),
            Err(err) => {
                warn!(error = %err, "failed to read refresh token");
                return Err(ApiError::AuthExpired);
            }
        };

        let spec = RequestSpec::new(Method::POST, endpoints::REFRESH_TOKEN)
            .public()
            .json(&serde_json::json!({ "refresh_token": refresh_token }))?;

        // Any failure here - network, non-2xx, garbled body - exhausts the
        // session; the caller will clear credentials and raise the event.
        let response = match self.send(&spec, None).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "token refresh request failed");
                return Err(ApiError::AuthExpired);
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(%status, "token refresh rejected");
            return Err(ApiError::AuthExpired);
        }

        let pair: TokenPair = match serde_json::from_str(&body) {
            Ok(pair) => pair,
            Err(err) => {
                warn!(error = %err, "invalid refresh response");
                return Err(ApiError::AuthExpired);
            }
        };

        self.store.set_access_token(&pair.access_token).await?;
        self.store.set_refresh_token(&pair.refresh_token).await?;
        debug!("token pair rotated");

        Ok(pair.access_token)
    }

    /// Terminal auth failure: clear credentials, then raise the eventable
    /// signal. The store is cleared before the emission so subscribers
    /// always observe an unauthenticated store.
    async fn expire_session(&self, err: ApiError) -> ApiError {
        if let Err(storage_err) = self.store.clear_all().await {
            warn!(error = %storage_err, "failed to clear credentials on session expiry");
        }
        self.events.emit(SessionEvent::TokenExpired);
        err
    }

    // ========================================================================
    // Authentication endpoints
    // ========================================================================

    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenPair, ApiError> {
        let spec = RequestSpec::new(Method::POST, endpoints::LOGIN)
            .public()
            .json(credentials)?;
        self.dispatch(spec).await
    }

    pub async fn register(&self, user: &RegisterRequest) -> Result<MessageResponse, ApiError> {
        let spec = RequestSpec::new(Method::POST, endpoints::REGISTER)
            .public()
            .json(user)?;
        self.dispatch(spec).await
    }

    /// Request a password-reset OTP to be sent to the given email.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let spec = RequestSpec::new(Method::POST, endpoints::RESET_PASSWORD)
            .public()
            .json(&serde_json::json!({ "email": email }))?;
        self.dispatch(spec).await
    }

    /// Exchange a 6-digit OTP for a short-lived reset token.
    pub async fn confirm_otp(&self, otp: &str) -> Result<OtpConfirmResponse, ApiError> {
        let spec = RequestSpec::new(Method::POST, endpoints::RESET_PASSWORD_CONFIRM)
            .public()
            .json(&serde_json::json!({ "otp": otp }))?;
        self.dispatch(spec).await
    }

    /// Finish the forgot-password flow. The reset token authorizes this
    /// call from inside the body.
    pub async fn complete_password_reset(
        &self,
        change: &ResetPasswordChange,
    ) -> Result<MessageResponse, ApiError> {
        let spec = RequestSpec::new(Method::POST, endpoints::RESET_PASSWORD_CHANGE)
            .public()
            .json(change)?;
        self.dispatch(spec).await
    }

    // ========================================================================
    // Profile endpoints
    // ========================================================================

    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.dispatch(RequestSpec::new(Method::GET, endpoints::PROFILE))
            .await
    }

    pub async fn update_profile(
        &self,
        changes: &UpdateProfileRequest,
    ) -> Result<MessageResponse, ApiError> {
        let spec = RequestSpec::new(Method::PUT, endpoints::PROFILE).json(changes)?;
        self.dispatch(spec).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let change = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let spec = RequestSpec::new(Method::POST, endpoints::CHANGE_PASSWORD).json(&change)?;
        self.dispatch(spec).await
    }

    /// Delete the account; the password travels in the request body as
    /// confirmation.
    pub async fn delete_account(&self, password: &str) -> Result<MessageResponse, ApiError> {
        let confirmation = DeleteAccountRequest {
            password: password.to_string(),
        };
        let spec = RequestSpec::new(Method::DELETE, endpoints::ACCOUNT).json(&confirmation)?;
        self.dispatch(spec).await
    }

    pub async fn upload_avatar(
        &self,
        image: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<MessageResponse, ApiError> {
        let spec = RequestSpec::new(Method::PUT, endpoints::AVATAR).multipart(vec![
            MultipartField {
                name: "avatar",
                file_name: file_name.to_string(),
                mime: mime.to_string(),
                bytes: image,
            },
        ]);
        self.dispatch(spec).await
    }

    // ========================================================================
    // Prediction endpoints
    // ========================================================================

    /// Upload an OCT scan for classification. Uses the extended timeout;
    /// inference can take well beyond the default request budget.
    pub async fn predict(
        &self,
        image: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<PredictionResult, ApiError> {
        let spec = RequestSpec::new(Method::POST, endpoints::PREDICT)
            .multipart(vec![MultipartField {
                name: "image",
                file_name: file_name.to_string(),
                mime: mime.to_string(),
                bytes: image,
            }])
            .timeout(self.config.predict_timeout);
        self.dispatch(spec).await
    }

    pub async fn fetch_history(&self, page: u32, page_size: u32) -> Result<HistoryPage, ApiError> {
        let spec = RequestSpec::new(Method::GET, endpoints::PREDICTION_HISTORY)
            .query("page", page)
            .query("page_size", page_size);
        self.dispatch(spec).await
    }

    pub async fn fetch_prediction(&self, prediction_id: &str) -> Result<PredictionResult, ApiError> {
        let path = format!("{}/{}", endpoints::PREDICTIONS, prediction_id);
        self.dispatch(RequestSpec::new(Method::GET, path)).await
    }

    pub async fn delete_prediction(&self, prediction_id: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("{}/{}", endpoints::PREDICTIONS, prediction_id);
        self.dispatch(RequestSpec::new(Method::DELETE, path)).await
    }
}
