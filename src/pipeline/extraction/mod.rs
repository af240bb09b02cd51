pub mod types;
pub mod normalize;
pub mod response_parser;
pub mod preprocess;
pub mod vocabulary;
pub mod ocr;
pub mod remote;
pub mod openai;
pub mod gemini;
pub mod strategy;
pub mod orchestrator;

pub use types::*;
pub use normalize::*;
pub use response_parser::*;
pub use preprocess::*;
pub use vocabulary::*;
pub use ocr::*;
pub use strategy::*;
pub use orchestrator::*;

use thiserror::Error;

/// Everything that can end an extraction attempt.
///
/// The `Display` text is what the user sees: `ExtractionResult::error`
/// carries it verbatim, so the messages are written as complete sentences
/// and remote failures are prefixed with the provider name.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to process image: Invalid image format ({0})")]
    ImageFormat(String),

    #[error("Failed to convert image to JPEG format ({0})")]
    Encoding(String),

    #[error("Failed to create {provider} request: {reason}")]
    RequestBuild {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} API error: {message}")]
    RemoteApi {
        provider: &'static str,
        message: String,
    },

    #[error("Failed to parse {provider} response")]
    ResponseParse { provider: &'static str },

    #[error("Text recognition error: {0}")]
    Recognition(String),

    #[error("{provider} API error: {description}")]
    Transport {
        provider: &'static str,
        description: String,
    },
}

impl ExtractionError {
    /// Build the `RemoteApi` error for a non-success status, preferring the
    /// provider's own message and falling back to `HTTP <status>`.
    pub fn remote_api(provider: &'static str, status: u16, message: Option<String>) -> Self {
        Self::RemoteApi {
            provider,
            message: message.unwrap_or_else(|| format!("HTTP {status}")),
        }
    }
}
