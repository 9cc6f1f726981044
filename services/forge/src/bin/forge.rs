//! services/forge/src/bin/forge.rs
//!
//! Runs today's spin for a local player and, when a prompt is given on the
//! command line, forges one card.

use cardforge_core::ports::{Clock, RandomSource};
use cardforge_core::{
    AspectHint, GenerationParameters, ImagePrompt, ProviderChoice, RewardCatalog, RewardSnapshot,
};
use clap::{Parser, ValueEnum};
use forge_lib::{
    adapters::{FsCardArtStore, InMemoryHistoryStore, ReqwestTransport, RngRandomSource, SystemClock},
    config::Config,
    error::AppError,
    forge::CardForge,
    state::AppState,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "forge", version, about = "Daily spin and card forging")]
struct Cli {
    /// Card art prompt. Without one, only today's spin runs.
    prompt: Vec<String>,
    /// `instance` or `flat`; defaults to DEFAULT_PROVIDER.
    #[arg(long)]
    provider: Option<ProviderChoice>,
    #[arg(long, value_enum)]
    aspect: Option<AspectArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AspectArg {
    Square,
    Portrait,
    Landscape,
    Wide,
    Tall,
}

impl From<AspectArg> for AspectHint {
    fn from(arg: AspectArg) -> Self {
        match arg {
            AspectArg::Square => AspectHint::Square,
            AspectArg::Portrait => AspectHint::Portrait,
            AspectArg::Landscape => AspectHint::Landscape,
            AspectArg::Wide => AspectHint::Wide,
            AspectArg::Tall => AspectHint::Tall,
        }
    }
}

fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(RngRandomSource::seeded(seed)),
        None => Box::new(RngRandomSource::from_entropy()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to render output: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded.");

    // --- 2. Initialize Adapters ---
    let transport = Arc::new(
        ReqwestTransport::new(config.generation_timeout)
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?,
    );
    let gateway = Arc::new(AppState::build_gateway(&config, transport));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // --- 3. Build the Shared AppState ---
    let app_state = AppState {
        config: config.clone(),
        catalog: Arc::new(RewardCatalog::standard()),
        gateway,
        history: Arc::new(InMemoryHistoryStore::new()),
        card_art: Arc::new(FsCardArtStore::new(config.card_art_dir.clone())),
        clock: clock.clone(),
    };

    // --- 4. Today's Spin ---
    let session = app_state.open_session(
        Uuid::new_v4(),
        random_source(config.spin_seed),
        RewardSnapshot::default(),
    );
    let spin = session.daily_spin(clock.today()).await?;
    print_json(&spin)?;

    // --- 5. Optional Card Forge ---
    if cli.prompt.is_empty() {
        return Ok(());
    }

    let choice = match cli.provider {
        Some(choice) => choice,
        None => {
            config.default_provider_settings()?;
            config.default_provider
        }
    };
    let mut prompt = ImagePrompt::new(cli.prompt.join(" "));
    if let Some(aspect) = cli.aspect {
        prompt = prompt.with_aspect(aspect.into());
    }

    let forge = CardForge::from_state(&app_state, random_source(config.spin_seed.map(|s| s ^ 0x5eed)));
    let card = forge
        .forge_card(&session, &prompt, &GenerationParameters::default(), choice)
        .await?;
    print_json(&card)?;

    Ok(())
}
