//! OCT prediction wire types.
//!
//! The backend classifies a retinal scan into one of four classes and
//! optionally attaches a Grad-CAM heatmap analysis locating the region
//! that drove the classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Disease classes the model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseClass {
    #[serde(rename = "CNV")]
    Cnv,
    #[serde(rename = "DME")]
    Dme,
    #[serde(rename = "DRUSEN")]
    Drusen,
    #[serde(rename = "NORMAL")]
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl DiseaseClass {
    pub fn full_name(&self) -> &'static str {
        match self {
            DiseaseClass::Cnv => "Choroidal Neovascularization",
            DiseaseClass::Dme => "Diabetic Macular Edema",
            DiseaseClass::Drusen => "Drusen",
            DiseaseClass::Normal => "Normal",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiseaseClass::Cnv => "Abnormal blood vessel growth in the choroid layer",
            DiseaseClass::Dme => "Fluid accumulation in the macula due to diabetes",
            DiseaseClass::Drusen => "Yellow deposits under the retina",
            DiseaseClass::Normal => "No abnormalities detected",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiseaseClass::Cnv | DiseaseClass::Dme => Severity::High,
            DiseaseClass::Drusen => Severity::Medium,
            DiseaseClass::Normal => Severity::None,
        }
    }
}

impl std::fmt::Display for DiseaseClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiseaseClass::Cnv => write!(f, "CNV"),
            DiseaseClass::Dme => write!(f, "DME"),
            DiseaseClass::Drusen => write!(f, "DRUSEN"),
            DiseaseClass::Normal => write!(f, "NORMAL"),
        }
    }
}

/// Per-class softmax output, each in `0.0..=1.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "CNV")]
    pub cnv: f64,
    #[serde(rename = "DME")]
    pub dme: f64,
    #[serde(rename = "DRUSEN")]
    pub drusen: f64,
    #[serde(rename = "NORMAL")]
    pub normal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Success,
    Failed,
    Error,
}

/// Grad-CAM hot-area measurement over the heatmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradCamAnalysis {
    pub analysis_status: AnalysisStatus,
    #[serde(default)]
    pub image_size_pixels: Option<String>,
    pub total_pixels: i64,
    pub threshold: f64,
    pub hot_area_pixels: i64,
    pub hot_area_ratio: f64,
    pub hot_area_percent: f64,
    pub bb_width_pixels: i64,
    pub bb_height_pixels: i64,
    #[serde(default)]
    pub error_detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub id: String,
    pub user_id: String,
    pub predicted_class: DiseaseClass,
    /// Confidence of the predicted class, `0.0..=1.0`.
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub image_url: String,
    /// Server-side inference time in milliseconds.
    pub inference_time: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub heatmap_url: Option<String>,
    #[serde(default)]
    pub analysis_result: Option<GradCamAnalysis>,
}

/// Compact entry in the paginated history listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionHistoryItem {
    pub id: String,
    pub user_id: String,
    pub predicted_class: DiseaseClass,
    pub confidence: f64,
    pub thumbnail_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub items: Vec<PredictionHistoryItem>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}
