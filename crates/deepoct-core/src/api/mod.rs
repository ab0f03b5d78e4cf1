//! Authenticated REST pipeline for the DeepOCT backend.
//!
//! `ApiClient` injects bearer tokens from the credential store, performs a
//! single-flight refresh-and-retry on 401, and raises session events when
//! the session cannot be recovered. `ApiError` is the error taxonomy
//! surfaced to the services layer.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
