//! Extraction method selection and dispatch.
//!
//! The set of backends is closed, so dispatch is a plain enum match rather
//! than a trait object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::gemini::GenerativeModelStrategy;
use super::ocr::LocalOcrStrategy;
use super::openai::ChatModelStrategy;
use super::preprocess::Photo;
use super::types::{ExtractionResult, ProgressFn};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Which backend turns the photo into items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionType {
    /// On-device text recognition.
    #[default]
    Local,
    /// Hosted chat-completion model.
    #[serde(rename = "openai", alias = "open_ai", alias = "chatgpt")]
    OpenAi,
    /// Hosted generative model.
    #[serde(alias = "gemini")]
    Google,
}

impl ExtractionType {
    pub const ALL: [ExtractionType; 3] = [Self::Local, Self::OpenAi, Self::Google];

    /// Label shown in settings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local => "On-device OCR",
            Self::OpenAi => "ChatGPT (OpenAI)",
            Self::Google => "Google Gemini",
        }
    }

    /// Whether this method sends the photo off the device.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for ExtractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::OpenAi => write!(f, "openai"),
            Self::Google => write!(f, "google"),
        }
    }
}

impl FromStr for ExtractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ocr" | "vision" => Ok(Self::Local),
            "openai" | "open_ai" | "chatgpt" => Ok(Self::OpenAi),
            "google" | "gemini" => Ok(Self::Google),
            other => Err(format!("unknown extraction method: {other}")),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════════════════════

/// A configured backend, ready to run.
pub enum ExtractionStrategy {
    LocalOcr(LocalOcrStrategy),
    ChatModel(ChatModelStrategy),
    GenerativeModel(GenerativeModelStrategy),
}

impl ExtractionStrategy {
    pub fn method(&self) -> ExtractionType {
        match self {
            Self::LocalOcr(_) => ExtractionType::Local,
            Self::ChatModel(_) => ExtractionType::OpenAi,
            Self::GenerativeModel(_) => ExtractionType::Google,
        }
    }

    /// Run the backend once. Failures are folded into the result's `error`.
    pub async fn extract(&self, photo: &Photo, progress: ProgressFn<'_>) -> ExtractionResult {
        let outcome = match self {
            Self::LocalOcr(s) => s.extract(photo, progress).await,
            Self::ChatModel(s) => s.extract(photo, progress).await,
            Self::GenerativeModel(s) => s.extract(photo, progress).await,
        };
        ExtractionResult::from(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::ocr::MockRecognizer;
    use image::{DynamicImage, RgbImage};
    use std::sync::Arc;

    #[test]
    fn display_and_parse_agree() {
        for method in ExtractionType::ALL {
            assert_eq!(method.to_string().parse::<ExtractionType>().unwrap(), method);
        }
    }

    #[test]
    fn parse_accepts_aliases_case_insensitively() {
        assert_eq!("Gemini".parse::<ExtractionType>().unwrap(), ExtractionType::Google);
        assert_eq!(" ChatGPT ".parse::<ExtractionType>().unwrap(), ExtractionType::OpenAi);
        assert!("carrier-pigeon".parse::<ExtractionType>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&ExtractionType::OpenAi).unwrap(), "\"openai\"");
        let parsed: ExtractionType = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(parsed, ExtractionType::Google);
    }

    #[test]
    fn only_local_stays_on_device() {
        assert!(!ExtractionType::Local.is_remote());
        assert!(ExtractionType::OpenAi.is_remote());
        assert!(ExtractionType::Google.is_remote());
    }

    #[tokio::test]
    async fn failure_is_folded_into_result() {
        let strategy = ExtractionStrategy::LocalOcr(LocalOcrStrategy::new(
            Arc::new(MockRecognizer::failing("no engine")),
            vec![],
        ));
        let photo = Photo::from_image(DynamicImage::ImageRgb8(RgbImage::new(8, 8)));
        let result = strategy.extract(&photo, &|_: &str| {}).await;

        assert_eq!(strategy.method(), ExtractionType::Local);
        assert!(result.is_failure());
        assert!(result.items.is_empty());
        assert_eq!(result.error.as_deref(), Some("Text recognition error: no engine"));
    }
}
