//! crates/cardforge_core/src/domain.rs
//!
//! Defines the pure, core data structures for card artwork generation and the
//! reward economy. These structs are independent of any vendor wire format or
//! storage medium.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on prompt length, in characters.
pub const MAX_PROMPT_CHARS: usize = 4000;

//=========================================================================================
// Image Generation
//=========================================================================================

/// Coarse framing requested for a piece of card art.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectHint {
    Square,
    Portrait,
    Landscape,
    Wide,
    Tall,
}

impl AspectHint {
    /// The `W:H` ratio string used by instance-style vendors.
    pub fn ratio(self) -> &'static str {
        match self {
            AspectHint::Square => "1:1",
            AspectHint::Portrait => "3:4",
            AspectHint::Landscape => "4:3",
            AspectHint::Wide => "16:9",
            AspectHint::Tall => "9:16",
        }
    }

    /// The pixel size string used by flat-prompt vendors.
    pub fn size(self) -> &'static str {
        match self {
            AspectHint::Square => "1024x1024",
            AspectHint::Portrait | AspectHint::Tall => "1024x1792",
            AspectHint::Landscape | AspectHint::Wide => "1792x1024",
        }
    }
}

/// User-supplied text describing the desired card artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt {
    pub text: String,
    pub aspect_hint: Option<AspectHint>,
}

impl ImagePrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            aspect_hint: None,
        }
    }

    pub fn with_aspect(mut self, hint: AspectHint) -> Self {
        self.aspect_hint = Some(hint);
        self
    }
}

/// Rendering quality tier for vendors that expose one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    #[default]
    Standard,
    Hd,
}

impl QualityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Standard => "standard",
            QualityTier::Hd => "hd",
        }
    }
}

/// How a flat-prompt vendor should hand back the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Url,
    InlineBase64,
}

/// Vendor-neutral knobs for one generation request. Each provider reads the
/// fields its API understands and ignores the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    pub sample_count: u8,
    pub negative_prompt: Option<String>,
    /// JPEG compression quality, 0..=100.
    pub compression_quality: Option<u8>,
    pub locale: Option<String>,
    pub quality: QualityTier,
    pub response_format: ResponseFormat,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            sample_count: 1,
            negative_prompt: None,
            compression_quality: None,
            locale: None,
            quality: QualityTier::Standard,
            response_format: ResponseFormat::Url,
        }
    }
}

/// Discriminator for how a `GeneratedImage` carries its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageEncoding {
    InlineBase64,
    RemoteUrl,
}

impl ImageEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageEncoding::InlineBase64 => "inline-base64",
            ImageEncoding::RemoteUrl => "remote-url",
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one of decoded bytes or a remote location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Decoded from the vendor's inline base64 field.
    InlineBase64(Vec<u8>),
    RemoteUrl(String),
}

/// A normalized generation result. Ownership passes to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub payload: ImagePayload,
    pub mime_type: String,
    pub revised_prompt: Option<String>,
}

impl GeneratedImage {
    pub fn encoding(&self) -> ImageEncoding {
        match self.payload {
            ImagePayload::InlineBase64(_) => ImageEncoding::InlineBase64,
            ImagePayload::RemoteUrl(_) => ImageEncoding::RemoteUrl,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            ImagePayload::InlineBase64(bytes) => Some(bytes),
            ImagePayload::RemoteUrl(_) => None,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        match &self.payload {
            ImagePayload::RemoteUrl(url) => Some(url),
            ImagePayload::InlineBase64(_) => None,
        }
    }
}

/// Which vendor integration the gateway should route a request to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderChoice {
    InstanceBased,
    FlatPrompt,
}

impl ProviderChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderChoice::InstanceBased => "instance",
            ProviderChoice::FlatPrompt => "flat",
        }
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instance" | "instance_based" => Ok(ProviderChoice::InstanceBased),
            "flat" | "flat_prompt" => Ok(ProviderChoice::FlatPrompt),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

//=========================================================================================
// Rewards
//=========================================================================================

/// The closed set of outcomes on the daily spin wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpinRewardType {
    Energy,
    Coins,
    Gems,
    FreePack,
    RarityBoost,
    StreakProtection,
    Jackpot,
}

impl SpinRewardType {
    /// Every variant, in wheel order.
    pub const ALL: [SpinRewardType; 7] = [
        SpinRewardType::Energy,
        SpinRewardType::Coins,
        SpinRewardType::Gems,
        SpinRewardType::FreePack,
        SpinRewardType::RarityBoost,
        SpinRewardType::StreakProtection,
        SpinRewardType::Jackpot,
    ];
}

/// A single spin result. Immutable once drawn; history is owned by a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub reward_type: SpinRewardType,
    pub amount: u32,
    /// Companion gems payout, non-zero only for `Jackpot`.
    pub bonus_gems: u32,
    pub streak_day_at_spin: u32,
    pub timestamp: DateTime<Utc>,
}

/// Rewards that a streak milestone can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreakRewardType {
    Coins,
    Gems,
    Energy,
    FreePack,
    RarityBoost,
    StreakProtection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakMilestone {
    pub day: u32,
    pub reward_type: StreakRewardType,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub last_active_day: Option<NaiveDate>,
    pub protection_charges: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RarityBoostState {
    pub active: bool,
    pub boost_percent: f64,
    pub expires_after_generations: u32,
}

/// The combined result of one `RewardEngine::spin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub outcome: SpinOutcome,
    pub milestones_crossed: Vec<StreakMilestone>,
}

/// Currency the collaborator still has to credit after a spin. Boosts and
/// protection charges are applied inside the engine and are not repeated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardGrant {
    pub coins: u64,
    pub gems: u64,
    pub energy: u64,
    pub free_packs: u64,
}

/// Serializable copy of a player's mutable reward state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardSnapshot {
    pub streak: StreakState,
    pub boost: RarityBoostState,
    pub last_spin_day: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_choice_parses_short_and_long_names() {
        assert_eq!("flat".parse::<ProviderChoice>(), Ok(ProviderChoice::FlatPrompt));
        assert_eq!(
            " Instance ".parse::<ProviderChoice>(),
            Ok(ProviderChoice::InstanceBased)
        );
        assert!("gemini".parse::<ProviderChoice>().is_err());
    }

    #[test]
    fn generated_image_exposes_only_its_populated_payload() {
        let inline = GeneratedImage {
            payload: ImagePayload::InlineBase64(vec![1, 2, 3]),
            mime_type: "image/png".to_string(),
            revised_prompt: None,
        };
        assert_eq!(inline.encoding(), ImageEncoding::InlineBase64);
        assert_eq!(inline.bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(inline.source_url(), None);

        let remote = GeneratedImage {
            payload: ImagePayload::RemoteUrl("https://cdn.example/a.png".to_string()),
            mime_type: "image/png".to_string(),
            revised_prompt: Some("a dragon".to_string()),
        };
        assert_eq!(remote.encoding().as_str(), "remote-url");
        assert_eq!(remote.bytes(), None);
        assert_eq!(remote.source_url(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn spin_reward_type_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&SpinRewardType::StreakProtection).unwrap();
        assert_eq!(json, "\"STREAK_PROTECTION\"");
    }
}
