//! Local preferences: dark mode and display language.
//!
//! Preferences live in the same key-value store as the credentials but
//! under their own keys, so they survive logout and session expiry.
//! Storage faults degrade to defaults rather than surfacing errors.

use std::sync::Arc;

use tracing::warn;

use crate::storage::KeyValueStore;

const DARK_MODE_KEY: &str = "dark_mode";
const LANGUAGE_KEY: &str = "language";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Vietnamese,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Vietnamese => "vi",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::English),
            "vi" => Some(Language::Vietnamese),
            _ => None,
        }
    }
}

pub struct SettingsService {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn set_dark_mode(&self, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        if let Err(err) = self.store.set(DARK_MODE_KEY, value).await {
            warn!(error = %err, "failed to save dark mode preference");
        }
    }

    pub async fn dark_mode(&self) -> bool {
        match self.store.get(DARK_MODE_KEY).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                warn!(error = %err, "failed to read dark mode preference");
                false
            }
        }
    }

    pub async fn set_language(&self, language: Language) {
        if let Err(err) = self.store.set(LANGUAGE_KEY, language.code()).await {
            warn!(error = %err, "failed to save language preference");
        }
    }

    pub async fn language(&self) -> Language {
        match self.store.get(LANGUAGE_KEY).await {
            Ok(Some(code)) => Language::from_code(&code).unwrap_or_default(),
            Ok(None) => Language::default(),
            Err(err) => {
                warn!(error = %err, "failed to read language preference");
                Language::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_preferences_default_when_unset() {
        let settings = SettingsService::new(Arc::new(MemoryStore::new()));
        assert!(!settings.dark_mode().await);
        assert_eq!(settings.language().await, Language::English);
    }

    #[tokio::test]
    async fn test_preferences_roundtrip() {
        let settings = SettingsService::new(Arc::new(MemoryStore::new()));

        settings.set_dark_mode(true).await;
        settings.set_language(Language::Vietnamese).await;

        assert!(settings.dark_mode().await);
        assert_eq!(settings.language().await, Language::Vietnamese);
    }

    #[tokio::test]
    async fn test_unknown_language_code_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set(LANGUAGE_KEY, "fr").await.unwrap();

        let settings = SettingsService::new(store);
        assert_eq!(settings.language().await, Language::English);
    }
}
