//! Portal configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{LanguageCode, LanguageCodeValidationError};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/";
const DEFAULT_LANGUAGE: &str = "en";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid API base URL '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("API base URL '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("invalid default language: {0}")]
    InvalidLanguage(#[from] LanguageCodeValidationError),
}

/// Configuration values for reaching the remote portal API.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Base URL every API route is resolved against.
    pub api_base_url: Option<String>,
    /// Ceiling applied to each remote call, in milliseconds. Defaults to ten
    /// seconds.
    #[ortho_config(default = 10_000)]
    pub request_timeout_ms: u64,
    /// Language whose dictionary is loaded at start-up.
    pub default_language: Option<String>,
}

impl PortalSettings {
    /// Return the configured base URL, falling back to the local default.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL);
        let url = Url::parse(raw).map_err(|source| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedScheme(raw.to_owned()));
        }
        Ok(url)
    }

    /// Return the request timeout. Zero is raised to one millisecond.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    /// Return the configured start-up language, falling back to English.
    pub fn default_language(&self) -> Result<LanguageCode, SettingsError> {
        let raw = self.default_language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
        Ok(LanguageCode::new(raw)?)
    }
}
