//! Configuration types for the chat application.
//!
//! The chat takes no command-line arguments. Everything here is fixed at
//! startup from defaults and a handful of environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::DEFAULT_TIMEOUT;
use crate::credential::DEFAULT_SETTINGS_FILE;
use crate::types::Model;

/// Overrides the default model.
pub const MODEL_ENV: &str = "GEMINI_MODEL";

/// Overrides the API base URL.
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

/// Overrides the request timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "GEMINI_TIMEOUT_SECS";

/// Disables ANSI styling when set to a non-empty value.
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// API base URL; `None` uses the public endpoint.
    pub base_url: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// File a prompted API key is appended to on request.
    pub settings_path: PathBuf,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-2.0-flash
    /// - Timeout: 120 seconds
    /// - Color: enabled
    /// - Settings file: `.env`
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            use_color: true,
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
        }
    }

    /// Resolves the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolves the configuration through `lookup`.
    ///
    /// Empty values count as unset. An unparsable timeout is ignored with a
    /// warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::new();
        if let Some(model) = get(MODEL_ENV) {
            config.model = model.parse().unwrap_or(Model::Custom(model));
        }
        if let Some(base_url) = get(BASE_URL_ENV) {
            config.base_url = Some(base_url.trim().to_string());
        }
        if let Some(timeout) = get(TIMEOUT_ENV) {
            match timeout.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!("ignoring {TIMEOUT_ENV}={timeout:?}: expected a positive integer"),
            }
        }
        if get(NO_COLOR_ENV).is_some() {
            config.use_color = false;
        }
        config
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the settings file path.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini20Flash));
        assert_eq!(config.base_url, None);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.use_color);
        assert_eq!(config.settings_path, PathBuf::from(".env"));
    }

    #[test]
    fn config_from_empty_environment() {
        assert_eq!(ChatConfig::from_lookup(lookup(&[])), ChatConfig::new());
    }

    #[test]
    fn config_from_environment() {
        let config = ChatConfig::from_lookup(lookup(&[
            (MODEL_ENV, "gemini-1.5-pro"),
            (BASE_URL_ENV, " http://localhost:8080/v1beta/ "),
            (TIMEOUT_ENV, "15"),
            (NO_COLOR_ENV, "1"),
        ]));
        assert_eq!(config.model, Model::Known(KnownModel::Gemini15Pro));
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://localhost:8080/v1beta/")
        );
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(!config.use_color);
    }

    #[test]
    fn config_ignores_bad_or_empty_values() {
        let config = ChatConfig::from_lookup(lookup(&[
            (MODEL_ENV, ""),
            (TIMEOUT_ENV, "soon"),
            (NO_COLOR_ENV, ""),
        ]));
        assert_eq!(config, ChatConfig::new());

        let config = ChatConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "0")]));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn custom_model_from_environment() {
        let config = ChatConfig::from_lookup(lookup(&[(MODEL_ENV, "gemini-exp-1206")]));
        assert_eq!(config.model, Model::Custom("gemini-exp-1206".to_string()));
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model(Model::Known(KnownModel::Gemini25Flash))
            .with_base_url("http://127.0.0.1:1/")
            .with_timeout(Duration::from_secs(5))
            .without_color()
            .with_settings_path("/tmp/settings");

        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Flash));
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:1/"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.use_color);
        assert_eq!(config.settings_path, PathBuf::from("/tmp/settings"));
    }
}
