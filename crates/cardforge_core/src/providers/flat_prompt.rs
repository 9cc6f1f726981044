//! crates/cardforge_core/src/providers/flat_prompt.rs
//!
//! Integration for vendors that take a single flat prompt and answer with a
//! list of generated images, usually as remote URLs.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{send_json, unparsed_rejection, ProviderClient, ProviderError};
use crate::domain::{
    GeneratedImage, GenerationParameters, ImagePayload, ImagePrompt, ResponseFormat,
};
use crate::ports::{Endpoint, Transport};

//=========================================================================================
// Wire Shapes
//=========================================================================================

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    created: Option<i64>,
    #[serde(default)]
    data: Option<Vec<ImageDatum>>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
}

//=========================================================================================
// The Provider
//=========================================================================================

/// Sends `{model, prompt, n, size, ...}` requests and takes the first image entry.
#[derive(Clone)]
pub struct FlatPromptProvider {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    model: String,
}

impl FlatPromptProvider {
    pub fn new(
        transport: Arc<dyn Transport>,
        url: impl Into<String>,
        api_key: &str,
        model: impl Into<String>,
    ) -> Self {
        let endpoint = Endpoint::new(url)
            .with_header("content-type", "application/json")
            .with_header("authorization", format!("Bearer {}", api_key));
        Self {
            transport,
            endpoint,
            model: model.into(),
        }
    }

    fn build_request<'a>(
        &'a self,
        prompt: &'a ImagePrompt,
        params: &'a GenerationParameters,
    ) -> ImagesRequest<'a> {
        ImagesRequest {
            model: self.model.as_str(),
            prompt: prompt.text.as_str(),
            n: params.sample_count.max(1),
            size: prompt.aspect_hint.map(|hint| hint.size()).unwrap_or("1024x1024"),
            quality: params.quality.as_str(),
            response_format: match params.response_format {
                ResponseFormat::Url => "url",
                ResponseFormat::InlineBase64 => "b64_json",
            },
        }
    }

    fn parse_rejection(status: u16, body: &str) -> ProviderError {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ProviderError::Rejected {
                message: envelope.error.message.unwrap_or_default(),
                category: envelope
                    .error
                    .kind
                    .unwrap_or_else(|| format!("http_{}", status)),
                code: envelope.error.code,
                status,
            },
            Err(_) => unparsed_rejection(status, body),
        }
    }

    fn parse_success(body: &[u8]) -> Result<GeneratedImage, ProviderError> {
        let response: ImagesResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let Some(datum) = response.data.unwrap_or_default().into_iter().next() else {
            return Err(ProviderError::EmptyResult);
        };
        debug!(created = response.created, "Flat-prompt vendor returned an image.");

        let payload = match (datum.url, datum.b64_json) {
            (Some(url), _) if !url.is_empty() => ImagePayload::RemoteUrl(url),
            (_, Some(encoded)) if !encoded.is_empty() => {
                let bytes = BASE64.decode(encoded.as_bytes()).map_err(|e| {
                    ProviderError::MalformedResponse(format!("base64 decode failed: {}", e))
                })?;
                ImagePayload::InlineBase64(bytes)
            }
            _ => return Err(ProviderError::EmptyResult),
        };

        let mime_type = match &payload {
            ImagePayload::RemoteUrl(url) => mime_from_url(url),
            ImagePayload::InlineBase64(_) => "image/png",
        };

        Ok(GeneratedImage {
            payload,
            mime_type: mime_type.to_string(),
            revised_prompt: datum.revised_prompt,
        })
    }
}

/// Guesses the content type from the URL path's extension.
fn mime_from_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else {
        "image/png"
    }
}

#[async_trait]
impl ProviderClient for FlatPromptProvider {
    fn name(&self) -> &str {
        "flat"
    }

    async fn generate_image(
        &self,
        prompt: &ImagePrompt,
        params: &GenerationParameters,
    ) -> Result<GeneratedImage, ProviderError> {
        let request = self.build_request(prompt, params);
        debug!(
            endpoint = %self.endpoint.url,
            model = request.model,
            size = request.size,
            "Sending flat-prompt image request."
        );

        let body = send_json(
            self.transport.as_ref(),
            &self.endpoint,
            &request,
            Self::parse_rejection,
        )
        .await?;

        Self::parse_success(&body)
    }
}
