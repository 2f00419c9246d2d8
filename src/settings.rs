//! Environment-sourced settings, validated at process start.

use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{
    LlmConfig, COMPAT_DEFAULT_MAX_TOKENS, COMPAT_DEFAULT_TEMPERATURE, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};

/// Settings loading errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide configuration.
///
/// Two independent model profiles: the primary endpoint and an
/// OpenAI-compatibility endpoint with its own defaults. A missing required
/// key or an unparseable numeric fails loading up front, not at first use.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model_name: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,

    pub compat_api_key: String,
    pub compat_base_url: Option<String>,
    pub compat_model_name: Option<String>,
    pub compat_max_tokens: u32,
    pub compat_temperature: f32,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load(|name| env::var(name).ok())
    }

    fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        Ok(Self {
            api_key: required(&lookup, "MODEL_API_KEY")?,
            base_url: lookup("MODEL_BASE_URL"),
            model_name: lookup("MODEL_NAME"),
            temperature: parsed(&lookup, "MODEL_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_tokens: parsed(&lookup, "MODEL_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            max_retries: parsed(&lookup, "MODEL_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            compat_api_key: required(&lookup, "COMPAT_API_KEY")?,
            compat_base_url: lookup("COMPAT_BASE_URL"),
            compat_model_name: lookup("COMPAT_MODEL_NAME"),
            compat_max_tokens: parsed(&lookup, "COMPAT_MAX_TOKENS", COMPAT_DEFAULT_MAX_TOKENS)?,
            compat_temperature: parsed(
                &lookup,
                "COMPAT_TEMPERATURE",
                COMPAT_DEFAULT_TEMPERATURE,
            )?,
        })
    }

    /// Client configuration for the primary endpoint.
    pub fn llm_config(&self) -> LlmConfig {
        let mut config = LlmConfig::default()
            .with_api_key(&self.api_key)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_max_retries(self.max_retries);
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(name) = &self.model_name {
            config = config.with_model_name(name);
        }
        config
    }

    /// Client configuration for the OpenAI-compatibility endpoint.
    pub fn compatibility_config(&self) -> LlmConfig {
        let mut config = LlmConfig::default()
            .with_api_key(&self.compat_api_key)
            .with_temperature(self.compat_temperature)
            .with_max_tokens(self.compat_max_tokens);
        if let Some(url) = &self.compat_base_url {
            config = config.with_base_url(url);
        }
        if let Some(name) = &self.compat_model_name {
            config = config.with_model_name(name);
        }
        config
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, SettingsError> {
    lookup(name).ok_or(SettingsError::Missing(name))
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, SettingsError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| SettingsError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_fails() {
        let result = Settings::load(lookup_from(&[("COMPAT_API_KEY", "ck")]));
        assert!(matches!(
            result,
            Err(SettingsError::Missing("MODEL_API_KEY"))
        ));
    }

    #[test]
    fn test_compatibility_profile_defaults() {
        let settings = Settings::load(lookup_from(&[
            ("MODEL_API_KEY", "pk"),
            ("COMPAT_API_KEY", "ck"),
        ]))
        .unwrap();
        assert_eq!(settings.compat_max_tokens, 8192);
        assert_eq!(settings.compat_temperature, 0.5);
    }

    #[test]
    fn test_invalid_numeric_fails() {
        let result = Settings::load(lookup_from(&[
            ("MODEL_API_KEY", "pk"),
            ("COMPAT_API_KEY", "ck"),
            ("MODEL_MAX_TOKENS", "not-a-number"),
        ]));
        assert!(matches!(
            result,
            Err(SettingsError::Invalid {
                name: "MODEL_MAX_TOKENS",
                ..
            })
        ));
    }

    #[test]
    fn test_profiles_are_independent() {
        let settings = Settings::load(lookup_from(&[
            ("MODEL_API_KEY", "pk"),
            ("MODEL_BASE_URL", "https://primary.example.com/v1"),
            ("MODEL_NAME", "deepseek-chat"),
            ("COMPAT_API_KEY", "ck"),
            ("COMPAT_BASE_URL", "https://compat.example.com/v1"),
            ("COMPAT_TEMPERATURE", "0.9"),
        ]))
        .unwrap();

        let primary = settings.llm_config();
        let compat = settings.compatibility_config();

        assert_eq!(primary.base_url, "https://primary.example.com/v1");
        assert_eq!(primary.model_name.as_deref(), Some("deepseek-chat"));
        assert_eq!(primary.temperature, DEFAULT_TEMPERATURE);

        assert_eq!(compat.base_url, "https://compat.example.com/v1");
        assert_eq!(compat.api_key, "ck");
        assert_eq!(compat.temperature, 0.9);
        assert_eq!(compat.max_tokens, 8192);
    }

    #[test]
    fn test_unset_model_name_stays_unset() {
        let settings = Settings::load(lookup_from(&[
            ("MODEL_API_KEY", "pk"),
            ("COMPAT_API_KEY", "ck"),
        ]))
        .unwrap();
        assert_eq!(settings.llm_config().model_name, None);
    }
}
