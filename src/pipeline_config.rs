//! Extraction configuration handed to the coordinator at call time.
//!
//! Nothing in the extraction core reads settings on its own: the caller
//! builds an `ExtractionConfig` (from saved settings, the environment, or a
//! test fixture) and passes it in for each run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::extraction::remote::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::pipeline::extraction::ExtractionType;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Chat models offered in settings, in display order.
pub const CHAT_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"];
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_GENERATIVE_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro-exp-03-25:generateContent";

/// Environment variables read by `ExtractionConfig::from_env`.
pub mod env_vars {
    pub const METHOD: &str = "IMAGE2LIST_METHOD";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_MODEL: &str = "IMAGE2LIST_OPENAI_MODEL";
    pub const OPENAI_ENDPOINT: &str = "IMAGE2LIST_OPENAI_ENDPOINT";
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
    pub const GEMINI_ENDPOINT: &str = "IMAGE2LIST_GEMINI_ENDPOINT";
    pub const CUSTOM_WORDS: &str = "IMAGE2LIST_CUSTOM_WORDS";
    pub const TIMEOUT_SECS: &str = "IMAGE2LIST_TIMEOUT_SECS";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    InvalidMethod(String),

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Unknown chat model {0:?}; expected one of: {models}", models = CHAT_MODELS.join(", "))]
    UnknownModel(String),
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Hosted chat-completion model settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatModelConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
}

impl Default for ChatModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Hosted generative model settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeModelConfig {
    pub api_key: String,
    pub endpoint: String,
}

impl Default for GenerativeModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_GENERATIVE_ENDPOINT.to_string(),
        }
    }
}

/// Everything one extraction run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub method: ExtractionType,
    pub chat: ChatModelConfig,
    pub generative: GenerativeModelConfig,
    /// Extra words for on-device recognition.
    pub custom_words: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            method: ExtractionType::default(),
            chat: ChatModelConfig::default(),
            generative: GenerativeModelConfig::default(),
            custom_words: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ExtractionConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup; unset or blank values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(method) = get(env_vars::METHOD) {
            config.method = method.parse().map_err(ConfigError::InvalidMethod)?;
        }
        if let Some(key) = get(env_vars::OPENAI_API_KEY) {
            config.chat.api_key = key;
        }
        if let Some(model) = get(env_vars::OPENAI_MODEL) {
            if !CHAT_MODELS.contains(&model.as_str()) {
                return Err(ConfigError::UnknownModel(model));
            }
            config.chat.model = model;
        }
        if let Some(endpoint) = get(env_vars::OPENAI_ENDPOINT) {
            config.chat.endpoint = endpoint;
        }
        if let Some(key) = get(env_vars::GOOGLE_API_KEY) {
            config.generative.api_key = key;
        }
        if let Some(endpoint) = get(env_vars::GEMINI_ENDPOINT) {
            config.generative.endpoint = endpoint;
        }
        if let Some(words) = get(env_vars::CUSTOM_WORDS) {
            config.custom_words = parse_custom_words(&words);
        }
        if let Some(raw) = get(env_vars::TIMEOUT_SECS) {
            config.request_timeout_secs = raw
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidNumber {
                    var: env_vars::TIMEOUT_SECS,
                    value: raw,
                })?;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Name of the key variable a remote method needs but lacks, if any.
    pub fn missing_api_key(&self) -> Option<&'static str> {
        if !self.method.is_remote() {
            return None;
        }
        let (key, var) = match self.method {
            ExtractionType::Google => (&self.generative.api_key, env_vars::GOOGLE_API_KEY),
            _ => (&self.chat.api_key, env_vars::OPENAI_API_KEY),
        };
        key.is_empty().then_some(var)
    }
}

/// Split a comma-separated word list, trimming entries and dropping blanks.
pub fn parse_custom_words(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.method, ExtractionType::Local);
        assert_eq!(config.chat.model, "gpt-4o");
        assert_eq!(config.chat.max_tokens, 1000);
        assert!(config.chat.endpoint.ends_with("/v1/chat/completions"));
        assert!(config.generative.endpoint.ends_with(":generateContent"));
        assert!(config.custom_words.is_empty());
        assert!(CHAT_MODELS.contains(&DEFAULT_CHAT_MODEL));
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ExtractionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn environment_overrides() {
        let config = ExtractionConfig::from_lookup(lookup(&[
            (env_vars::METHOD, "gemini"),
            (env_vars::GOOGLE_API_KEY, " g-key "),
            (env_vars::OPENAI_MODEL, "gpt-4o-mini"),
            (env_vars::CUSTOM_WORDS, "kombucha, tahini,,  "),
            (env_vars::TIMEOUT_SECS, "15"),
        ]))
        .unwrap();

        assert_eq!(config.method, ExtractionType::Google);
        assert_eq!(config.generative.api_key, "g-key");
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert_eq!(config.custom_words, vec!["kombucha", "tahini"]);
        assert_eq!(config.request_timeout().as_secs(), 15);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = ExtractionConfig::from_lookup(lookup(&[(env_vars::METHOD, "fax")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMethod(_)));
    }

    #[test]
    fn unlisted_chat_model_is_rejected() {
        let err = ExtractionConfig::from_lookup(lookup(&[(env_vars::OPENAI_MODEL, "gpt-5-ultra")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModel(ref m) if m == "gpt-5-ultra"));
        assert!(err.to_string().contains("gpt-4o-mini"));
    }

    #[test]
    fn missing_api_key_only_for_remote_methods() {
        let local = ExtractionConfig::default();
        assert_eq!(local.missing_api_key(), None);

        let mut chat = ExtractionConfig {
            method: ExtractionType::OpenAi,
            ..ExtractionConfig::default()
        };
        assert_eq!(chat.missing_api_key(), Some(env_vars::OPENAI_API_KEY));
        chat.chat.api_key = "sk".into();
        assert_eq!(chat.missing_api_key(), None);

        let google = ExtractionConfig::from_lookup(lookup(&[
            (env_vars::METHOD, "google"),
            (env_vars::OPENAI_API_KEY, "sk"),
        ]))
        .unwrap();
        assert_eq!(google.missing_api_key(), Some(env_vars::GOOGLE_API_KEY));
    }

    #[test]
    fn zero_or_garbage_timeout_is_rejected() {
        for bad in ["0", "soon"] {
            let err =
                ExtractionConfig::from_lookup(lookup(&[(env_vars::TIMEOUT_SECS, bad)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidNumber { .. }));
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ExtractionConfig =
            serde_json::from_str(r#"{"method":"openai","chat":{"api_key":"sk"}}"#).unwrap();
        assert_eq!(config.method, ExtractionType::OpenAi);
        assert_eq!(config.chat.api_key, "sk");
        assert_eq!(config.chat.model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn custom_words_split_and_trim() {
        assert_eq!(parse_custom_words(" a , b ,c"), vec!["a", "b", "c"]);
        assert!(parse_custom_words(" , ,").is_empty());
    }
}
