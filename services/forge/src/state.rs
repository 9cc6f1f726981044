//! services/forge/src/state.rs
//!
//! Defines the application's shared and player-specific states.

use crate::config::Config;
use cardforge_core::ports::{CardArtStore, Clock, HistoryStore, PortResult, RandomSource, Transport};
use cardforge_core::{
    FlatPromptProvider, ImageGenerationGateway, InstanceBasedProvider, ProviderChoice,
    RewardCatalog, RewardEngine, RewardGrant, RewardSnapshot, SpinResult, StreakPhase,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Players)
//=========================================================================================

/// The shared application state, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<RewardCatalog>,
    pub gateway: Arc<ImageGenerationGateway>,
    pub history: Arc<dyn HistoryStore>,
    pub card_art: Arc<dyn CardArtStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Registers every vendor whose key is configured on top of one shared transport.
    pub fn build_gateway(config: &Config, transport: Arc<dyn Transport>) -> ImageGenerationGateway {
        let mut gateway = ImageGenerationGateway::new(config.generation_timeout);

        if let Some(settings) = &config.instance_provider {
            gateway = gateway.with_provider(
                ProviderChoice::InstanceBased,
                Arc::new(InstanceBasedProvider::new(
                    transport.clone(),
                    settings.endpoint.clone(),
                    &settings.api_key,
                )),
            );
        }
        if let Some(settings) = &config.flat_provider {
            gateway = gateway.with_provider(
                ProviderChoice::FlatPrompt,
                Arc::new(FlatPromptProvider::new(
                    transport,
                    settings.endpoint.clone(),
                    &settings.api_key,
                    settings.model.clone().unwrap_or_default(),
                )),
            );
        }

        info!(
            instance = gateway.is_configured(ProviderChoice::InstanceBased),
            flat = gateway.is_configured(ProviderChoice::FlatPrompt),
            "Image gateway ready."
        );
        gateway
    }

    /// Opens a session for one player, starting from a previously saved snapshot.
    pub fn open_session(
        &self,
        user_id: Uuid,
        random: Box<dyn RandomSource>,
        snapshot: RewardSnapshot,
    ) -> PlayerSession {
        let engine = RewardEngine::restore(self.catalog.clone(), random, self.clock.clone(), snapshot);
        PlayerSession::new(user_id, engine, self.history.clone())
    }
}

//=========================================================================================
// PlayerSession (Specific to One Player)
//=========================================================================================

/// What one daily spin produced, including the currency to credit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySpin {
    pub user_id: Uuid,
    pub result: SpinResult,
    pub grant: RewardGrant,
}

/// The single writer for one player's reward state.
pub struct PlayerSession {
    pub user_id: Uuid,
    engine: Mutex<RewardEngine>,
    history: Arc<dyn HistoryStore>,
}

impl PlayerSession {
    pub fn new(user_id: Uuid, engine: RewardEngine, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            user_id,
            engine: Mutex::new(engine),
            history,
        }
    }

    /// Spins and records the outcome while holding the engine lock, so no other
    /// caller can observe the new streak before the history entry exists. If the
    /// history write fails the engine is rewound and the spin never happened.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn daily_spin(&self, today: NaiveDate) -> PortResult<DailySpin> {
        let mut engine = self.engine.lock().await;
        let before = engine.snapshot();
        let result = engine.spin(today);
        if let Err(err) = self.history.append(&result.outcome).await {
            warn!(error = %err, "Spin history write failed; rewinding.");
            engine.rewind(before);
            return Err(err);
        }

        let grant = RewardEngine::grant_for(&result);
        info!(
            reward = ?result.outcome.reward_type,
            amount = result.outcome.amount,
            streak = result.outcome.streak_day_at_spin,
            milestones = result.milestones_crossed.len(),
            "Daily spin recorded."
        );
        Ok(DailySpin {
            user_id: self.user_id,
            result,
            grant,
        })
    }

    pub async fn has_spun_on(&self, day: NaiveDate) -> bool {
        self.engine.lock().await.has_spun_on(day)
    }

    pub async fn streak_phase(&self, today: NaiveDate) -> StreakPhase {
        self.engine.lock().await.streak_phase(today)
    }

    /// Spends one boosted generation and returns the percent to apply to it.
    pub async fn consume_rarity_boost(&self) -> f64 {
        self.engine.lock().await.consume_generation_rarity_boost()
    }

    pub async fn snapshot(&self) -> RewardSnapshot {
        self.engine.lock().await.snapshot()
    }
}
