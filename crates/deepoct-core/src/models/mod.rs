//! Wire types for the DeepOCT backend.
//!
//! - `auth`: login/register/password-reset requests and token responses
//! - `user`: profile payloads and account management requests
//! - `prediction`: OCT inference results, history pages, Grad-CAM analysis

pub mod auth;
pub mod prediction;
pub mod user;

pub use auth::{
    LoginRequest, MessageResponse, OtpConfirmResponse, RegisterRequest, ResetPasswordChange,
    TokenPair,
};
pub use prediction::{
    AnalysisStatus, ClassProbabilities, DiseaseClass, GradCamAnalysis, HistoryPage,
    PredictionHistoryItem, PredictionResult, Severity,
};
pub use user::{
    ChangePasswordRequest, DeleteAccountRequest, UpdateProfileRequest, UserProfile,
};
