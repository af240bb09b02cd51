use std::sync::Arc;

use tracing::{info, warn, Instrument};

use super::gemini::GenerativeModelStrategy;
use super::ocr::LocalOcrStrategy;
use super::openai::ChatModelStrategy;
use super::preprocess::Photo;
use super::remote::http_client;
use super::strategy::{ExtractionStrategy, ExtractionType};
use super::types::{ExtractionResult, ProgressFn, TextRecognizer};
use crate::models::checklist::ChecklistItem;
use crate::pipeline_config::ExtractionConfig;

/// Selects a backend from the configuration it is handed and runs it.
///
/// Holds only the on-device recognizer; keys, model ids and the active
/// method arrive with each call.
pub struct ExtractionCoordinator {
    recognizer: Arc<dyn TextRecognizer + Send + Sync>,
}

impl ExtractionCoordinator {
    pub fn new(recognizer: Arc<dyn TextRecognizer + Send + Sync>) -> Self {
        Self { recognizer }
    }

    /// Build the strategy the configuration selects.
    pub fn strategy_for(&self, config: &ExtractionConfig) -> ExtractionStrategy {
        match config.method {
            ExtractionType::Local => ExtractionStrategy::LocalOcr(LocalOcrStrategy::new(
                Arc::clone(&self.recognizer),
                config.custom_words.clone(),
            )),
            ExtractionType::OpenAi => ExtractionStrategy::ChatModel(ChatModelStrategy::new(
                http_client(config.request_timeout()),
                config.chat.clone(),
            )),
            ExtractionType::Google => {
                ExtractionStrategy::GenerativeModel(GenerativeModelStrategy::new(
                    http_client(config.request_timeout()),
                    config.generative.clone(),
                ))
            }
        }
    }

    /// Run one extraction with the configured backend.
    pub async fn run(
        &self,
        config: &ExtractionConfig,
        photo: &Photo,
        progress: ProgressFn<'_>,
    ) -> ExtractionResult {
        progress("Starting image processing...");
        let strategy = self.strategy_for(config);
        let (width, height) = photo.dimensions();

        let span = tracing::info_span!(
            "extraction",
            method = %strategy.method(),
            width,
            height,
        );
        let start = std::time::Instant::now();
        let result = strategy
            .extract(photo, progress)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result.error {
            Some(error) => warn!(
                error = %error,
                elapsed_ms = %start.elapsed().as_millis(),
                "Extraction failed"
            ),
            None => info!(
                items = result.items.len(),
                elapsed_ms = %start.elapsed().as_millis(),
                "Extraction complete"
            ),
        });
        result
    }
}

/// Turn a finished extraction into fresh checklist items, or its error message.
///
/// `originalIndex` is the item's zero-based position in the result.
pub fn checklist_items(result: ExtractionResult) -> Result<Vec<ChecklistItem>, String> {
    if let Some(error) = result.error {
        return Err(error);
    }
    Ok(result
        .items
        .into_iter()
        .enumerate()
        .map(|(index, text)| ChecklistItem::new(text, index))
        .collect())
}
