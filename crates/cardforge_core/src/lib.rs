pub mod domain;
pub mod gateway;
pub mod ports;
pub mod providers;
pub mod rarity;
pub mod rewards;

#[cfg(test)]
mod test_support;

pub use domain::{
    AspectHint, GeneratedImage, GenerationParameters, ImageEncoding, ImagePayload, ImagePrompt,
    ProviderChoice, QualityTier, RarityBoostState, ResponseFormat, RewardGrant, RewardSnapshot,
    SpinOutcome, SpinResult, SpinRewardType, StreakMilestone, StreakRewardType, StreakState,
    MAX_PROMPT_CHARS,
};
pub use gateway::{GatewayError, GatewayErrorKind, ImageGenerationGateway};
pub use ports::{
    CardArtStore, Clock, Endpoint, HistoryStore, PortError, PortResult, RandomSource, Transport,
    TransportError,
};
pub use providers::{FlatPromptProvider, InstanceBasedProvider, ProviderClient, ProviderError};
pub use rarity::{CardRarity, RarityOdds};
pub use rewards::{CatalogError, RewardCatalog, RewardEngine, SpinRewardEntry, StreakPhase};
