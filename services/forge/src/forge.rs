//! services/forge/src/forge.rs
//!
//! Turns a player's prompt into a stored card: rarity roll under the player's
//! boost, artwork from the gateway, art handed to the `CardArtStore`.

use crate::error::AppError;
use crate::state::{AppState, PlayerSession};
use cardforge_core::ports::{CardArtStore, RandomSource};
use cardforge_core::{
    CardRarity, GatewayError, GenerationParameters, ImageEncoding, ImageGenerationGateway,
    ImagePrompt, ProviderChoice, RarityOdds,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

/// A freshly forged card, ready for the host app to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForgedCard {
    pub card_id: Uuid,
    pub rarity: CardRarity,
    /// The boost that applied to the rarity roll; 0 when none was active.
    pub boost_percent: f64,
    pub encoding: ImageEncoding,
    /// Where the `CardArtStore` put the artwork.
    pub location: String,
    pub revised_prompt: Option<String>,
}

pub struct CardForge {
    gateway: Arc<ImageGenerationGateway>,
    card_art: Arc<dyn CardArtStore>,
    odds: RarityOdds,
    random: Mutex<Box<dyn RandomSource>>,
}

impl CardForge {
    pub fn new(
        gateway: Arc<ImageGenerationGateway>,
        card_art: Arc<dyn CardArtStore>,
        odds: RarityOdds,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            gateway,
            card_art,
            odds,
            random: Mutex::new(random),
        }
    }

    pub fn from_state(state: &AppState, random: Box<dyn RandomSource>) -> Self {
        Self::new(
            state.gateway.clone(),
            state.card_art.clone(),
            RarityOdds::standard(),
            random,
        )
    }

    pub async fn forge_card(
        &self,
        session: &PlayerSession,
        prompt: &ImagePrompt,
        params: &GenerationParameters,
        choice: ProviderChoice,
    ) -> Result<ForgedCard, AppError> {
        self.forge_card_with_cancel(session, prompt, params, choice, &CancellationToken::new())
            .await
    }

    /// Forges one card. Requests that fail before reaching a vendor (bad prompt,
    /// unknown provider) leave the player's rarity boost untouched.
    #[instrument(skip(self, session, prompt, params, cancel), fields(user_id = %session.user_id, provider = %choice))]
    pub async fn forge_card_with_cancel(
        &self,
        session: &PlayerSession,
        prompt: &ImagePrompt,
        params: &GenerationParameters,
        choice: ProviderChoice,
        cancel: &CancellationToken,
    ) -> Result<ForgedCard, AppError> {
        ImageGenerationGateway::validate_prompt(prompt)?;
        if !self.gateway.is_configured(choice) {
            return Err(GatewayError::ProviderNotConfigured(choice).into());
        }

        let boost_percent = session.consume_rarity_boost().await;
        let rarity = {
            let mut random = self.random.lock().await;
            self.odds.roll(random.as_mut(), boost_percent)
        };

        let image = self
            .gateway
            .generate_with_cancel(prompt, params, choice, cancel)
            .await?;

        let card_id = Uuid::new_v4();
        let encoding = image.encoding();
        let revised_prompt = image.revised_prompt.clone();
        let location = self.card_art.store(card_id, image).await?;

        info!(card_id = %card_id, rarity = ?rarity, boost_percent, "Card forged.");
        Ok(ForgedCard {
            card_id,
            rarity,
            boost_percent,
            encoding,
            location,
            revised_prompt,
        })
    }
}
