//! crates/cardforge_core/src/gateway.rs
//!
//! The single entry point for card artwork generation. Validates prompts,
//! routes to the selected `ProviderClient`, bounds each call by a timeout and
//! folds the vendor-specific failures into one `GatewayError`.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::domain::{GeneratedImage, GenerationParameters, ImagePrompt, ProviderChoice, MAX_PROMPT_CHARS};
use crate::providers::{ProviderClient, ProviderError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

//=========================================================================================
// Gateway Error
//=========================================================================================

/// How a failed upstream call should be presented: retry, blocked, or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    NoContentReturned,
    UpstreamRejected,
    UpstreamUnavailable,
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GatewayErrorKind::NoContentReturned => "no content returned",
            GatewayErrorKind::UpstreamRejected => "upstream rejected",
            GatewayErrorKind::UpstreamUnavailable => "upstream unavailable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Rejected locally, before any network call.
    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("no provider configured for '{0}'")]
    ProviderNotConfigured(ProviderChoice),

    /// The caller cancelled the call before the vendor answered.
    #[error("generation cancelled")]
    Cancelled,

    /// The vendor failure, reclassified. `category` and `code` are the vendor's own values.
    #[error("{kind}: {underlying_message}")]
    Upstream {
        kind: GatewayErrorKind,
        underlying_message: String,
        category: Option<String>,
        code: Option<String>,
    },
}

impl GatewayError {
    pub fn kind(&self) -> Option<GatewayErrorKind> {
        match self {
            GatewayError::Upstream { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    fn upstream(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        GatewayError::Upstream {
            kind,
            underlying_message: message.into(),
            category: None,
            code: None,
        }
    }
}

fn content_policy_markers() -> &'static Regex {
    static MARKERS: OnceLock<Regex> = OnceLock::new();
    MARKERS.get_or_init(|| {
        Regex::new(r"(?i)content[_\s-]?policy|safety|moderation|responsible[_\s-]?ai|blocked|prohibited")
            .expect("content policy pattern is valid")
    })
}

fn is_content_policy(category: &str, code: Option<&str>) -> bool {
    let markers = content_policy_markers();
    markers.is_match(category) || code.is_some_and(|code| markers.is_match(code))
}

/// Maps a provider failure onto the three user-facing outcomes.
pub fn classify(err: ProviderError) -> GatewayError {
    match err {
        ProviderError::Rejected {
            message,
            category,
            code,
            status,
        } => {
            let kind = if is_content_policy(&category, code.as_deref()) {
                GatewayErrorKind::UpstreamRejected
            } else if status >= 500 || status == 408 || status == 429 {
                GatewayErrorKind::UpstreamUnavailable
            } else {
                GatewayErrorKind::NoContentReturned
            };
            GatewayError::Upstream {
                kind,
                underlying_message: message,
                category: Some(category),
                code,
            }
        }
        ProviderError::Transport(transport) => {
            GatewayError::upstream(GatewayErrorKind::UpstreamUnavailable, transport.to_string())
        }
        ProviderError::EmptyResult => GatewayError::upstream(
            GatewayErrorKind::NoContentReturned,
            "provider returned no image",
        ),
        ProviderError::MalformedResponse(message) => {
            GatewayError::upstream(GatewayErrorKind::NoContentReturned, message)
        }
    }
}

//=========================================================================================
// The Gateway
//=========================================================================================

/// Stateless router over the configured providers. Safe to share across tasks.
#[derive(Clone)]
pub struct ImageGenerationGateway {
    providers: HashMap<ProviderChoice, Arc<dyn ProviderClient>>,
    timeout: Duration,
}

impl ImageGenerationGateway {
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: HashMap::new(),
            timeout,
        }
    }

    pub fn with_provider(mut self, choice: ProviderChoice, provider: Arc<dyn ProviderClient>) -> Self {
        self.providers.insert(choice, provider);
        self
    }

    pub fn is_configured(&self, choice: ProviderChoice) -> bool {
        self.providers.contains_key(&choice)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks a prompt without touching the network.
    pub fn validate_prompt(prompt: &ImagePrompt) -> Result<(), GatewayError> {
        if prompt.text.trim().is_empty() {
            return Err(GatewayError::InvalidPrompt("prompt is empty".to_string()));
        }
        let length = prompt.text.chars().count();
        if length > MAX_PROMPT_CHARS {
            return Err(GatewayError::InvalidPrompt(format!(
                "prompt is {} characters, limit is {}",
                length, MAX_PROMPT_CHARS
            )));
        }
        Ok(())
    }

    pub async fn generate(
        &self,
        prompt: &ImagePrompt,
        params: &GenerationParameters,
        choice: ProviderChoice,
    ) -> Result<GeneratedImage, GatewayError> {
        self.generate_with_cancel(prompt, params, choice, &CancellationToken::new())
            .await
    }

    /// Like `generate`, but resolves to `Cancelled` as soon as `cancel` fires.
    #[instrument(skip(self, prompt, params, cancel), fields(provider = %choice))]
    pub async fn generate_with_cancel(
        &self,
        prompt: &ImagePrompt,
        params: &GenerationParameters,
        choice: ProviderChoice,
        cancel: &CancellationToken,
    ) -> Result<GeneratedImage, GatewayError> {
        Self::validate_prompt(prompt)?;

        let provider = self
            .providers
            .get(&choice)
            .ok_or(GatewayError::ProviderNotConfigured(choice))?;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Generation cancelled by caller.");
                return Err(GatewayError::Cancelled);
            }
            result = tokio::time::timeout(self.timeout, provider.generate_image(prompt, params)) => result,
        };

        match outcome {
            Ok(Ok(image)) => {
                info!(encoding = %image.encoding(), mime_type = %image.mime_type, "Image generated.");
                Ok(image)
            }
            Ok(Err(err)) => {
                let classified = classify(err);
                warn!(error = %classified, "Image generation failed.");
                Err(classified)
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "Image generation timed out.");
                Err(GatewayError::upstream(
                    GatewayErrorKind::UpstreamUnavailable,
                    format!(
                        "{} gave no answer within {:?}",
                        provider.name(),
                        self.timeout
                    ),
                ))
            }
        }
    }
}

impl Default for ImageGenerationGateway {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
