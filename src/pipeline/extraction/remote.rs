//! Plumbing shared by the hosted-model strategies: the extraction prompt,
//! HTTP client construction, request dispatch and error mapping.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ExtractionError;

/// Instruction sent alongside the photo to every hosted model.
pub const EXTRACTION_PROMPT: &str = "Extract all grocery items from this image. Return them as a JSON array of strings, with each item cleaned and normalized (lowercase, no special characters). Maintain any indicators of count or measurements (e.g., '2 apples', 'Avocado x 5', '1lb Chicken').";

/// MIME type of the uploaded photo.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Default per-request timeout for hosted models.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Build the async HTTP client used for hosted-model calls.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "HTTP client builder failed, using defaults");
            reqwest::Client::new()
        })
}

/// Error envelope both providers use: `{"error": {"message": "..."}}`.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Provider-supplied error message from a failure body, if present.
pub(crate) fn api_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiErrorBody>(body)
        .ok()?
        .error?
        .message
        .filter(|m| !m.trim().is_empty())
}

pub(crate) fn parse_endpoint(
    provider: &'static str,
    endpoint: &str,
) -> Result<reqwest::Url, ExtractionError> {
    reqwest::Url::parse(endpoint).map_err(|e| ExtractionError::RequestBuild {
        provider,
        reason: format!("invalid endpoint {endpoint:?}: {e}"),
    })
}

pub(crate) fn encode_body<T: Serialize>(
    provider: &'static str,
    body: &T,
) -> Result<Vec<u8>, ExtractionError> {
    serde_json::to_vec(body).map_err(|e| ExtractionError::RequestBuild {
        provider,
        reason: e.to_string(),
    })
}

/// Send a prepared JSON POST and return the raw success body.
///
/// Any non-2xx status becomes `RemoteApi`, carrying the provider's own
/// message when the body has one.
pub(crate) async fn send_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    body: Vec<u8>,
) -> Result<Vec<u8>, ExtractionError> {
    let response = request
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    if !status.is_success() {
        let message = api_error_message(&bytes);
        debug!(provider, status = status.as_u16(), has_message = message.is_some(), "Remote call rejected");
        return Err(ExtractionError::remote_api(provider, status.as_u16(), message));
    }

    Ok(bytes.to_vec())
}

/// Decode a success envelope; any shape mismatch is `ResponseParse`.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    provider: &'static str,
    body: &[u8],
) -> Result<T, ExtractionError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(provider, error = %e, "Unexpected response envelope");
        ExtractionError::ResponseParse { provider }
    })
}

fn transport_error(provider: &'static str, e: &reqwest::Error) -> ExtractionError {
    let description = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    ExtractionError::Transport {
        provider,
        description,
    }
}
