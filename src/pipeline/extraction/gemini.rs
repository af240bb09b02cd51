use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};

use super::preprocess::{Photo, JPEG_QUALITY};
use super::remote::{self, EXTRACTION_PROMPT, IMAGE_MIME_TYPE};
use super::response_parser::parse_item_list;
use super::types::ProgressFn;
use super::ExtractionError;
use crate::pipeline_config::GenerativeModelConfig;

const PROVIDER: &str = "Gemini";

/// Generative-model extraction: prompt and inline JPEG travel as two parts
/// of one content block; the API key rides in the `key` query parameter.
pub struct GenerativeModelStrategy {
    client: reqwest::Client,
    config: GenerativeModelConfig,
}

impl GenerativeModelStrategy {
    pub fn new(client: reqwest::Client, config: GenerativeModelConfig) -> Self {
        Self { client, config }
    }

    pub async fn extract(
        &self,
        photo: &Photo,
        progress: ProgressFn<'_>,
    ) -> Result<Vec<String>, ExtractionError> {
        progress("Preparing image for Google Gemini...");
        let jpeg = photo.encode_jpeg(JPEG_QUALITY)?;
        let data = base64::engine::general_purpose::STANDARD.encode(&jpeg);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: EXTRACTION_PROMPT,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: IMAGE_MIME_TYPE,
                            data: &data,
                        },
                    },
                ],
            }],
        };
        let body = remote::encode_body(PROVIDER, &request)?;
        let mut url = remote::parse_endpoint(PROVIDER, &self.config.endpoint)?;
        url.query_pairs_mut().append_pair("key", &self.config.api_key);

        // The URL carries the key, so only the host is recorded.
        let span = tracing::info_span!(
            "generative_model_extract",
            host = url.host_str().unwrap_or_default(),
            jpeg_bytes = jpeg.len(),
        );
        let start = std::time::Instant::now();

        progress("Sending image to Google Gemini...");
        let reply = remote::send_json(PROVIDER, self.client.post(url), body)
            .instrument(span.clone())
            .await?;

        progress("Processing Google Gemini response...");
        let envelope: GenerateResponse = remote::decode_envelope(PROVIDER, &reply)?;
        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(ExtractionError::ResponseParse { provider: PROVIDER })?;

        let items = parse_item_list(&text);
        span.in_scope(|| {
            info!(
                items = items.len(),
                elapsed_ms = %start.elapsed().as_millis(),
                "Generative model extraction complete"
            )
        });
        Ok(items)
    }
}

// ── Wire types ──

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
