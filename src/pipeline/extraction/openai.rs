use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};

use super::preprocess::{Photo, JPEG_QUALITY};
use super::remote::{self, EXTRACTION_PROMPT, IMAGE_MIME_TYPE};
use super::response_parser::parse_item_list;
use super::types::ProgressFn;
use super::ExtractionError;
use crate::pipeline_config::ChatModelConfig;

const PROVIDER: &str = "OpenAI";

/// Chat-completion extraction: the photo goes up as a data URL inside a
/// single user message, the reply text comes back in `choices[0]`.
pub struct ChatModelStrategy {
    client: reqwest::Client,
    config: ChatModelConfig,
}

impl ChatModelStrategy {
    pub fn new(client: reqwest::Client, config: ChatModelConfig) -> Self {
        Self { client, config }
    }

    pub async fn extract(
        &self,
        photo: &Photo,
        progress: ProgressFn<'_>,
    ) -> Result<Vec<String>, ExtractionError> {
        progress("Preparing image for OpenAI...");
        let jpeg = photo.encode_jpeg(JPEG_QUALITY)?;
        let data_url = format!(
            "data:{IMAGE_MIME_TYPE};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&jpeg)
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: EXTRACTION_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: &data_url },
                    },
                ],
            }],
            max_tokens: self.config.max_tokens,
        };
        let body = remote::encode_body(PROVIDER, &request)?;
        let url = remote::parse_endpoint(PROVIDER, &self.config.endpoint)?;

        let span = tracing::info_span!(
            "chat_model_extract",
            model = %self.config.model,
            jpeg_bytes = jpeg.len(),
        );
        let start = std::time::Instant::now();

        progress("Sending image to OpenAI...");
        let builder = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key);
        let reply = remote::send_json(PROVIDER, builder, body)
            .instrument(span.clone())
            .await?;

        progress("Processing OpenAI response...");
        let envelope: ChatResponse = remote::decode_envelope(PROVIDER, &reply)?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ExtractionError::ResponseParse { provider: PROVIDER })?;

        let items = parse_item_list(&content);
        span.in_scope(|| {
            info!(
                items = items.len(),
                elapsed_ms = %start.elapsed().as_millis(),
                "Chat model extraction complete"
            )
        });
        Ok(items)
    }
}

// ── Wire types ──

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}
