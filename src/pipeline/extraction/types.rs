use image::GrayImage;
use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Progress notification channel: one status line per call, invoked
/// synchronously on whatever task the strategy runs on.
pub type ProgressFn<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Outcome of one extraction attempt.
///
/// When `error` is populated the attempt failed and `items` must be ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub items: Vec<String>,
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(items: Vec<String>) -> Self {
        Self { items, error: None }
    }

    pub fn failure(error: &ExtractionError) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl From<Result<Vec<String>, ExtractionError>> for ExtractionResult {
    fn from(result: Result<Vec<String>, ExtractionError>) -> Self {
        match result {
            Ok(items) => Self::success(items),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Bounding box of a recognized region, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One transcription hypothesis for a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedCandidate {
    pub text: String,
    /// 0.0-1.0
    pub confidence: f32,
}

/// A detected text region with its candidates, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub candidates: Vec<RecognizedCandidate>,
    pub bounding_box: Option<BoundingBox>,
}

impl TextRegion {
    /// Region with a single transcription.
    pub fn single(text: &str, confidence: f32) -> Self {
        Self {
            candidates: vec![RecognizedCandidate {
                text: text.to_string(),
                confidence,
            }],
            bounding_box: None,
        }
    }

    pub fn top_candidate(&self) -> Option<&RecognizedCandidate> {
        self.candidates.first()
    }
}

/// Minimum recognized-text height, as a fraction of the image height.
pub const DEFAULT_MINIMUM_TEXT_HEIGHT: f32 = 0.01;

/// How a recognition pass should be run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionRequest {
    /// Favor accuracy over speed.
    pub accurate: bool,
    pub language_correction: bool,
    /// Fraction of image height below which text is ignored.
    pub minimum_text_height: f32,
    /// Domain words the engine should prefer (grocery nouns, units, ...).
    pub custom_words: Vec<String>,
}

impl RecognitionRequest {
    /// Accuracy-favoring pass with language correction, as used for shopping lists.
    pub fn accurate(custom_words: Vec<String>) -> Self {
        Self {
            accurate: true,
            language_correction: true,
            minimum_text_height: DEFAULT_MINIMUM_TEXT_HEIGHT,
            custom_words,
        }
    }
}

/// Text recognition engine abstraction (allows mocking for tests).
///
/// Blocking: callers run it off latency-sensitive threads.
pub trait TextRecognizer {
    /// Regions in the engine's detection order. An image without text
    /// yields an empty vector, not an error.
    fn recognize(
        &self,
        pixels: &GrayImage,
        request: &RecognitionRequest,
    ) -> Result<Vec<TextRegion>, ExtractionError>;
}
