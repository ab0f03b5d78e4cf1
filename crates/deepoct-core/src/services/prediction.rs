//! OCT scan prediction, history, and detail.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::models::{HistoryPage, PredictionResult};

use super::user::mime_for_path;
use super::Outcome;

/// First page when a caller passes something nonsensical.
const DEFAULT_PAGE: u32 = 1;

/// Default and maximum history page sizes.
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

pub struct PredictionService {
    api: Arc<ApiClient>,
}

impl PredictionService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Upload a scan image from disk and classify it.
    pub async fn predict(&self, path: &Path) -> Outcome<PredictionResult> {
        if path.as_os_str().is_empty() {
            return Outcome::fail("Image is required");
        }

        let image = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "could not read scan image");
                return Outcome::fail("Could not read image file");
            }
        };
        if image.is_empty() {
            return Outcome::fail("Image is required");
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "oct_scan.jpg".to_string());

        match self
            .api
            .predict(image, &file_name, mime_for_path(path))
            .await
        {
            Ok(result) => Outcome::ok("Prediction successful", result),
            Err(err) => Outcome::fail(prediction_message(&err)),
        }
    }

    /// Paginated history. Out-of-range paging inputs are clamped to
    /// defaults rather than rejected.
    pub async fn history(&self, page: u32, page_size: u32) -> Outcome<HistoryPage> {
        let page = if page < 1 { DEFAULT_PAGE } else { page };
        let page_size = if page_size < 1 || page_size > MAX_PAGE_SIZE {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };

        match self.api.fetch_history(page, page_size).await {
            Ok(history) => Outcome::ok("History loaded successfully", history),
            Err(err) => Outcome::fail(prediction_message(&err)),
        }
    }

    pub async fn detail(&self, prediction_id: &str) -> Outcome<PredictionResult> {
        if prediction_id.trim().is_empty() {
            return Outcome::fail("Prediction ID is required");
        }
        match self.api.fetch_prediction(prediction_id.trim()).await {
            Ok(result) => Outcome::ok("Prediction detail loaded successfully", result),
            Err(err) => Outcome::fail(prediction_message(&err)),
        }
    }

    pub async fn delete(&self, prediction_id: &str) -> Outcome {
        if prediction_id.trim().is_empty() {
            return Outcome::fail("Prediction ID is required");
        }
        match self.api.delete_prediction(prediction_id.trim()).await {
            Ok(response) => {
                let message = if response.msg.is_empty() {
                    "Prediction deleted successfully".to_string()
                } else {
                    response.msg
                };
                Outcome::ok_empty(message)
            }
            Err(err) => Outcome::fail(prediction_message(&err)),
        }
    }
}

/// Prediction-specific user messages; richer than the default mapping
/// because image upload has several distinct failure modes worth naming.
fn prediction_message(err: &ApiError) -> String {
    match err {
        ApiError::Validation { status: 400, detail } => detail
            .clone()
            .unwrap_or_else(|| "Invalid image. Please try another image.".to_string()),
        ApiError::AuthExpired
        | ApiError::Validation {
            status: 401 | 403, ..
        } => "Authentication required. Please login again.".to_string(),
        ApiError::Validation { status: 404, .. } => "Prediction not found.".to_string(),
        ApiError::Validation { status: 413, .. } => {
            "Image file is too large. Maximum size is 10MB.".to_string()
        }
        ApiError::Server { status: 500, .. } => "Server error. Please try again later.".to_string(),
        ApiError::Server { status: 503, .. } => {
            "Service temporarily unavailable. Please try again later.".to_string()
        }
        other => other.user_message(),
    }
}
