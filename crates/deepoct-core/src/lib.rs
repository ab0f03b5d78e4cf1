//! Core library for the DeepOCT client.
//!
//! This crate contains everything below the UI layer of the DeepOCT
//! retinal-scan diagnosis client:
//!
//! - `storage`: durable key-value storage and the credential store
//! - `events`: the in-process session event channel
//! - `api`: the authenticated request pipeline and typed endpoints
//! - `models`: wire types for auth, profile, and prediction data
//! - `services`: caller-facing operations returning uniform outcomes
//!
//! Front-ends construct one `CredentialStore`, one `SessionEvents` channel,
//! and one `ApiClient`, then drive the services and subscribe to session
//! events to react to expiry and logout.

pub mod api;
pub mod config;
pub mod events;
pub mod models;
pub mod services;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use config::ApiConfig;
pub use events::{SessionEvent, SessionEvents, SubscriptionId};
pub use storage::{CredentialStore, FileStore, KeyValueStore, MemoryStore, StorageError};
