//! crates/cardforge_core/src/providers/instance.rs
//!
//! Integration for vendors that take an array of prompt instances and answer
//! with base64 predictions (the `:predict` style).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{send_json, unparsed_rejection, ProviderClient, ProviderError};
use crate::domain::{GeneratedImage, GenerationParameters, ImagePayload, ImagePrompt};
use crate::ports::{Endpoint, Transport};

const DEFAULT_MIME_TYPE: &str = "image/png";

//=========================================================================================
// Wire Shapes
//=========================================================================================

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PromptInstance<'a>>,
    parameters: PredictParameters<'a>,
}

#[derive(Debug, Serialize)]
struct PromptInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u8,
    aspect_ratio: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_options: Option<OutputOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: &'static str,
    compression_quality: u8,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<i64>,
    message: Option<String>,
    status: Option<String>,
}

//=========================================================================================
// The Provider
//=========================================================================================

/// Sends `{instances, parameters}` requests and decodes the first prediction.
/// A first prediction without image bytes is an `EmptyResult`; later ones are ignored.
#[derive(Clone)]
pub struct InstanceBasedProvider {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
}

impl InstanceBasedProvider {
    /// `predict_url` is the full model endpoint, e.g. `.../models/<model>:predict`.
    pub fn new(transport: Arc<dyn Transport>, predict_url: impl Into<String>, api_key: &str) -> Self {
        let endpoint = Endpoint::new(predict_url)
            .with_header("content-type", "application/json")
            .with_header("x-goog-api-key", api_key);
        Self {
            transport,
            endpoint,
        }
    }

    fn build_request<'a>(
        prompt: &'a ImagePrompt,
        params: &'a GenerationParameters,
    ) -> PredictRequest<'a> {
        let output_options = params.compression_quality.map(|quality| OutputOptions {
            mime_type: "image/jpeg",
            compression_quality: quality.min(100),
        });

        PredictRequest {
            instances: vec![PromptInstance {
                prompt: prompt.text.as_str(),
            }],
            parameters: PredictParameters {
                sample_count: params.sample_count.max(1),
                aspect_ratio: prompt.aspect_hint.map(|hint| hint.ratio()).unwrap_or("1:1"),
                negative_prompt: params.negative_prompt.as_deref(),
                output_options,
                language: params.locale.as_deref(),
            },
        }
    }

    fn parse_rejection(status: u16, body: &str) -> ProviderError {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ProviderError::Rejected {
                message: envelope.error.message.unwrap_or_default(),
                category: envelope
                    .error
                    .status
                    .unwrap_or_else(|| format!("http_{}", status)),
                code: envelope.error.code.map(|code| code.to_string()),
                status,
            },
            Err(_) => unparsed_rejection(status, body),
        }
    }

    fn parse_success(body: &[u8]) -> Result<GeneratedImage, ProviderError> {
        let response: PredictResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let Some(prediction) = response.predictions.unwrap_or_default().into_iter().next() else {
            return Err(ProviderError::EmptyResult);
        };

        let encoded = match prediction.bytes_base64_encoded {
            Some(encoded) if !encoded.is_empty() => encoded,
            _ => {
                if let Some(reason) = prediction.rai_filtered_reason.as_deref() {
                    warn!(reason, "First prediction was filtered.");
                }
                return Err(ProviderError::EmptyResult);
            }
        };
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::MalformedResponse(format!("base64 decode failed: {}", e)))?;

        Ok(GeneratedImage {
            payload: ImagePayload::InlineBase64(bytes),
            mime_type: prediction
                .mime_type
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            revised_prompt: None,
        })
    }
}

#[async_trait]
impl ProviderClient for InstanceBasedProvider {
    fn name(&self) -> &str {
        "instance"
    }

    async fn generate_image(
        &self,
        prompt: &ImagePrompt,
        params: &GenerationParameters,
    ) -> Result<GeneratedImage, ProviderError> {
        let request = Self::build_request(prompt, params);
        debug!(
            endpoint = %self.endpoint.url,
            sample_count = request.parameters.sample_count,
            aspect_ratio = request.parameters.aspect_ratio,
            "Sending instance-based prediction request."
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
