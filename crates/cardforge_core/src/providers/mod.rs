//! crates/cardforge_core/src/providers/mod.rs
//!
//! The `ProviderClient` capability and its two vendor integrations. Each
//! variant owns its full request/response schema; the gateway only ever sees
//! the narrow `generate_image` contract.

pub mod flat_prompt;
pub mod instance;

pub use flat_prompt::FlatPromptProvider;
pub use instance::InstanceBasedProvider;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::domain::{GeneratedImage, GenerationParameters, ImagePrompt};
use crate::ports::{Endpoint, Transport, TransportError};

const MAX_ERROR_BODY_CHARS: usize = 512;

//=========================================================================================
// Provider Error
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The vendor reported success but handed back nothing usable.
    #[error("provider returned no image")]
    EmptyResult,

    /// The vendor answered with a non-success status. `category` and `code` are
    /// copied verbatim from the vendor's error body.
    #[error("provider rejected the request [{category}]: {message}")]
    Rejected {
        message: String,
        category: String,
        code: Option<String>,
        status: u16,
    },

    /// The request never produced a vendor answer (timeout, connection failure).
    #[error("transport failure: {0}")]
    Transport(TransportError),

    /// A success body that could not be decoded.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

//=========================================================================================
// The ProviderClient Capability
//=========================================================================================

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Translates the prompt into the vendor's request shape, sends it once and
    /// parses the first image from the response. Never retries.
    async fn generate_image(
        &self,
        prompt: &ImagePrompt,
        params: &GenerationParameters,
    ) -> Result<GeneratedImage, ProviderError>;
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Serializes `request`, sends it, and routes non-success statuses through the
/// vendor's own rejection parser.
pub(crate) async fn send_json<T: Serialize>(
    transport: &dyn Transport,
    endpoint: &Endpoint,
    request: &T,
    parse_rejection: fn(u16, &str) -> ProviderError,
) -> Result<Bytes, ProviderError> {
    let body = serde_json::to_vec(request)
        .map_err(|e| ProviderError::MalformedResponse(format!("request encoding failed: {}", e)))?;

    transport
        .send(endpoint, Bytes::from(body))
        .await
        .map_err(|err| match err {
            TransportError::Status { status, body } => parse_rejection(status, &body),
            other => ProviderError::Transport(other),
        })
}

/// Used when a vendor error body does not match its documented shape.
pub(crate) fn unparsed_rejection(status: u16, body: &str) -> ProviderError {
    ProviderError::Rejected {
        message: truncate_text(body.trim(), MAX_ERROR_BODY_CHARS),
        category: format!("http_{}", status),
        code: None,
        status,
    }
}

pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
