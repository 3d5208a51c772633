//! Runtime settings for the analysis pipeline.
//!
//! Every value comes from the environment (a `.env` file is loaded by the
//! binary first) and falls back to a default, so a bare environment yields a
//! working rules-only setup.
use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::api_connection::endpoints::{OPENROUTER_BASE_URL, OPENROUTER_DEFAULT_MODEL};

pub const DEFAULT_MODEL_PATH: &str = "model.bin";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SITE_URL: &str = "https://scanlabel-ai.com";
pub const DEFAULT_APP_NAME: &str = "ScanLabel AI";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Parse an optional numeric variable with a default value.
macro_rules! parse_env_u64 {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        match $lookup($var_name) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: $var_name,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => $default,
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// bincode classifier artifact.
    pub model_path: PathBuf,
    /// `None` disables the AI recommendation tier.
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    pub openrouter_timeout_secs: u64,
    pub site_url: String,
    pub app_name: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            openrouter_api_key: None,
            openrouter_base_url: OPENROUTER_BASE_URL.to_string(),
            openrouter_model: OPENROUTER_DEFAULT_MODEL.to_string(),
            openrouter_timeout_secs: DEFAULT_TIMEOUT_SECS,
            site_url: DEFAULT_SITE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let openrouter_timeout_secs =
            parse_env_u64!(get, "OPENROUTER_TIMEOUT", defaults.openrouter_timeout_secs);
        if openrouter_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "OPENROUTER_TIMEOUT",
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }

        Ok(Self {
            model_path: get("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            openrouter_api_key: get("OPENROUTER_API_KEY").map(|k| k.trim().to_string()),
            openrouter_base_url: get("OPENROUTER_API_BASE_URL")
                .unwrap_or(defaults.openrouter_base_url),
            openrouter_model: get("OPENROUTER_MODEL").unwrap_or(defaults.openrouter_model),
            openrouter_timeout_secs,
            site_url: get("SITE_URL").unwrap_or(defaults.site_url),
            app_name: get("APP_NAME").unwrap_or(defaults.app_name),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.openrouter_api_key.is_some()
    }

    /// Log the loaded settings. The API key is never printed in full.
    pub fn log_summary(&self) {
        info!("Loaded configuration:");
        info!("  MODEL_PATH={}", self.model_path.display());
        info!(
            "  OPENROUTER_API_KEY={}",
            self.openrouter_api_key
                .as_deref()
                .map(mask_secret)
                .unwrap_or_else(|| "<unset>".to_string())
        );
        info!("  OPENROUTER_API_BASE_URL={}", self.openrouter_base_url);
        info!("  OPENROUTER_MODEL={}", self.openrouter_model);
        info!("  OPENROUTER_TIMEOUT={}s", self.openrouter_timeout_secs);
        info!("  SITE_URL={}", self.site_url);
        info!("  APP_NAME={}", self.app_name);
        info!("  LOG_LEVEL={}", self.log_level);
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.has_api_key());
        assert_eq!(settings.openrouter_timeout_secs, 30);
        assert_eq!(settings.model_path, PathBuf::from("model.bin"));
    }

    #[test]
    fn test_values_override_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("MODEL_PATH", "/models/health.bin"),
            ("OPENROUTER_API_KEY", " sk-or-123 "),
            ("OPENROUTER_MODEL", "meta/llama"),
            ("OPENROUTER_TIMEOUT", "5"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(settings.model_path, PathBuf::from("/models/health.bin"));
        assert_eq!(settings.openrouter_api_key.as_deref(), Some("sk-or-123"));
        assert_eq!(settings.openrouter_model, "meta/llama");
        assert_eq!(settings.openrouter_timeout_secs, 5);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.app_name, DEFAULT_APP_NAME);
    }

    #[test]
    fn test_blank_api_key_counts_as_unset() {
        let settings =
            Settings::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "   ")])).unwrap();
        assert!(settings.openrouter_api_key.is_none());
    }

    #[test]
    fn test_invalid_timeout_is_error() {
        let err =
            Settings::from_lookup(lookup_from(&[("OPENROUTER_TIMEOUT", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "OPENROUTER_TIMEOUT", .. }
        ));
        assert!(Settings::from_lookup(lookup_from(&[("OPENROUTER_TIMEOUT", "0")])).is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("sk-or-v1-abcdef"), "sk-o****");
    }
}
