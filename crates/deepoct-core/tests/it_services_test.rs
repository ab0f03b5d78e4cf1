//! Integration tests for the services layer: login persistence, outcome
//! mapping, profile caching, and prediction flows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mockito::{Matcher, Server};
use serde_json::json;

use deepoct_core::services::{AuthService, PredictionService, UserService};
use deepoct_core::{
    ApiClient, ApiConfig, CredentialStore, MemoryStore, SessionEvent, SessionEvents,
};

fn profile_body() -> String {
    json!({
        "id": 9,
        "email": "doctor@example.com",
        "full_name": "Eye Doctor",
        "mobile_number": "0123456789",
        "date_of_birth": "1990-01-01",
        "is_active": true,
        "is_verified": true,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
    .to_string()
}

fn test_client(base_url: &str) -> (Arc<ApiClient>, CredentialStore, SessionEvents) {
    let store = CredentialStore::new(Arc::new(MemoryStore::new()));
    let events = SessionEvents::new();
    let config = ApiConfig::with_base_url(base_url);
    let api = Arc::new(ApiClient::new(config, store.clone(), events.clone()).unwrap());
    (api, store, events)
}

#[tokio::test]
async fn login_persists_token_pair() {
    //* Given
    let mut server = Server::new_async().await;
    let (api, store, _events) = test_client(&server.url());

    let login = server
        .mock("POST", "/login")
        .match_body(Matcher::Json(json!({
            "email": "doctor@example.com",
            "password": "hunter66"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "A1", "refresh_token": "R1", "token_type": "bearer"}"#)
        .expect(1)
        .create_async()
        .await;

    let auth = AuthService::new(api);

    //* When
    let outcome = auth.login("doctor@example.com", "hunter66").await;

    //* Then
    login.assert_async().await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Login successful");
    assert_eq!(store.access_token().await.unwrap().as_deref(), Some("A1"));
    assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("R1"));
    assert!(auth.is_authenticated().await);
}

#[tokio::test]
async fn login_rejection_surfaces_server_detail_without_refresh() {
    //* Given
    let mut server = Server::new_async().await;
    let (api, store, _events) = test_client(&server.url());

    server
        .mock("POST", "/login")
        .with_status(401)
        .with_body(r#"{"detail": "Incorrect email or password"}"#)
        .expect(1)
        .create_async()
        .await;

    // A 401 from a public endpoint must not be mistaken for session expiry
    let refresh = server
        .mock("POST", "/refresh-token")
        .expect(0)
        .create_async()
        .await;

    let auth = AuthService::new(api);

    //* When
    let outcome = auth.login("doctor@example.com", "wrong-pass").await;

    //* Then
    refresh.assert_async().await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Incorrect email or password");
    assert!(store.access_token().await.unwrap().is_none());
}

#[tokio::test]
async fn login_validates_input_before_any_network_call() {
    let server = Server::new_async().await;
    let (api, _store, _events) = test_client(&server.url());
    let auth = AuthService::new(api);

    let outcome = auth.login("", "password").await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Email and password are required");

    let outcome = auth.login("not-an-email", "password").await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Please enter a valid email");
}

#[tokio::test]
async fn logout_clears_store_and_emits_logout() {
    //* Given
    let server = Server::new_async().await;
    let (api, store, events) = test_client(&server.url());
    store.set_access_token("A1").await.unwrap();
    store.set_refresh_token("R1").await.unwrap();

    let logout_count = Arc::new(AtomicUsize::new(0));
    {
        let counter = Arc::clone(&logout_count);
        events.on(SessionEvent::Logout, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    let auth = AuthService::new(api);

    //* When
    auth.logout().await;

    //* Then
    assert!(!auth.is_authenticated().await);
    assert!(store.refresh_token().await.unwrap().is_none());
    assert_eq!(logout_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn get_profile_caches_user_data() {
    //* Given
    let mut server = Server::new_async().await;
    let (api, store, _events) = test_client(&server.url());

    server
        .mock("GET", "/profile")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profile_body())
        .expect(1)
        .create_async()
        .await;

    let user = UserService::new(api);

    //* When
    let outcome = user.get_profile().await;

    //* Then
    assert!(outcome.success);
    let fetched = outcome.data.unwrap();
    assert_eq!(fetched.id, 9);

    let cached = store.user_data().await.unwrap().unwrap();
    assert_eq!(cached.email, "doctor@example.com");
    assert_eq!(user.cached_profile().await.unwrap().id, 9);
}

#[tokio::test]
async fn history_clamps_out_of_range_pagination() {
    //* Given
    let mut server = Server::new_async().await;
    let (api, _store, _events) = test_client(&server.url());

    let history = server
        .mock("GET", "/predictions/history")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("page_size".into(), "20".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items": [], "total": 0, "page": 1, "page_size": 20}"#)
        .expect(1)
        .create_async()
        .await;

    let predictions = PredictionService::new(api);

    //* When: page 0 and an oversized page size both clamp to defaults
    let outcome = predictions.history(0, 500).await;

    //* Then
    history.assert_async().await;
    assert!(outcome.success);
    assert_eq!(outcome.data.unwrap().page, 1);
}

#[tokio::test]
async fn predict_uploads_scan_and_returns_result() {
    //* Given
    let mut server = Server::new_async().await;
    let (api, _store, _events) = test_client(&server.url());

    let body = json!({
        "id": "p-77",
        "user_id": "u-9",
        "predicted_class": "DRUSEN",
        "confidence": 0.87,
        "probabilities": {"CNV": 0.05, "DME": 0.05, "DRUSEN": 0.87, "NORMAL": 0.03},
        "image_url": "https://cdn.example.com/p-77.jpg",
        "inference_time": 512.0,
        "created_at": "2025-03-03T12:00:00Z"
    })
    .to_string();

    let predict = server
        .mock("POST", "/predictions/predict")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data".to_string()),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await;

    let scan_path = std::env::temp_dir().join(format!("deepoct-scan-{}.jpg", std::process::id()));
    tokio::fs::write(&scan_path, b"not really a jpeg").await.unwrap();

    let predictions = PredictionService::new(api);

    //* When
    let outcome = predictions.predict(&scan_path).await;

    //* Then
    predict.assert_async().await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.data.unwrap().id, "p-77");

    tokio::fs::remove_file(&scan_path).await.unwrap();
}

#[tokio::test]
async fn predict_rejects_missing_file_without_network() {
    let server = Server::new_async().await;
    let (api, _store, _events) = test_client(&server.url());
    let predictions = PredictionService::new(api);

    let outcome = predictions
        .predict(std::path::Path::new("/nonexistent/scan.jpg"))
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Could not read image file");
}

#[tokio::test]
async fn change_password_sends_both_fields_in_body() {
    //* Given
    let mut server = Server::new_async().await;
    let (api, store, _events) = test_client(&server.url());
    store.set_access_token("A1").await.unwrap();

    let change = server
        .mock("POST", "/change-password")
        .match_header("authorization", "Bearer A1")
        .match_body(Matcher::Json(json!({
            "current_password": "hunter66",
            "new_password": "hunter77"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"msg": "Password changed"}"#)
        .expect(1)
        .create_async()
        .await;

    let user = UserService::new(api);

    //* When
    let outcome = user.change_password("hunter66", "hunter77").await;

    //* Then
    change.assert_async().await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Password changed");
}

#[tokio::test]
async fn delete_account_clears_credentials() {
    //* Given
    let mut server = Server::new_async().await;
    let (api, store, _events) = test_client(&server.url());
    store.set_access_token("A1").await.unwrap();
    store.set_refresh_token("R1").await.unwrap();

    server
        .mock("DELETE", "/account")
        .match_body(Matcher::Json(json!({"password": "hunter66"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"msg": "Account deleted"}"#)
        .expect(1)
        .create_async()
        .await;

    let user = UserService::new(api);

    //* When
    let outcome = user.delete_account("hunter66").await;

    //* Then
    assert!(outcome.success);
    assert_eq!(outcome.message, "Account deleted");
    assert!(store.access_token().await.unwrap().is_none());
    assert!(store.refresh_token().await.unwrap().is_none());
}
