//! Session and forging flows against in-memory fakes and a temporary art directory.

use async_trait::async_trait;
use cardforge_core::ports::{CardArtStore, Clock, HistoryStore, PortError, PortResult, RandomSource};
use cardforge_core::providers::{ProviderClient, ProviderError};
use cardforge_core::{
    CardRarity, GatewayError, GatewayErrorKind, GeneratedImage, GenerationParameters,
    ImageEncoding, ImageGenerationGateway, ImagePayload, ImagePrompt, ProviderChoice,
    RarityBoostState, RarityOdds, RewardCatalog, RewardEngine, RewardSnapshot, SpinOutcome,
    SpinRewardType, StreakState,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use forge_lib::adapters::{FsCardArtStore, InMemoryHistoryStore};
use forge_lib::config::Config;
use forge_lib::error::AppError;
use forge_lib::forge::CardForge;
use forge_lib::state::{AppState, PlayerSession};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

struct Fixed(f64);

impl RandomSource for Fixed {
    fn next_uniform(&mut self) -> f64 {
        self.0
    }
}

struct March;

impl Clock for March {
    fn today(&self) -> NaiveDate {
        day(1)
    }

    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

/// Returns inline PNG bytes, or fails with a canned error.
struct FakeProvider {
    calls: AtomicUsize,
    fail_with: Option<ProviderError>,
}

impl FakeProvider {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_with: None,
        })
    }

    fn failing(err: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(err),
        })
    }
}

#[async_trait]
impl ProviderClient for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate_image(
        &self,
        _prompt: &ImagePrompt,
        _params: &GenerationParameters,
    ) -> Result<GeneratedImage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(GeneratedImage {
            payload: ImagePayload::InlineBase64(b"\x89PNG".to_vec()),
            mime_type: "image/png".to_string(),
            revised_prompt: Some("a storm drake, card art".to_string()),
        })
    }
}

/// Fails appends while `down` is set, otherwise behaves like the in-memory store.
struct FlakyHistory {
    down: AtomicBool,
    inner: InMemoryHistoryStore,
}

#[async_trait]
impl HistoryStore for FlakyHistory {
    async fn append(&self, outcome: &SpinOutcome) -> PortResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("history unavailable".to_string()));
        }
        self.inner.append(outcome).await
    }

    async fn read_all(&self) -> PortResult<Vec<SpinOutcome>> {
        self.inner.read_all().await
    }
}

struct Fixture {
    state: AppState,
    provider: Arc<FakeProvider>,
    _art_dir: tempfile::TempDir,
}

fn fixture(provider: Arc<FakeProvider>) -> Fixture {
    let art_dir = tempfile::tempdir().unwrap();
    let config = Config::from_lookup(|key| match key {
        "CARD_ART_DIR" => Some(art_dir.path().display().to_string()),
        _ => None,
    })
    .unwrap();

    let gateway = ImageGenerationGateway::new(config.generation_timeout)
        .with_provider(ProviderChoice::FlatPrompt, provider.clone());
    let card_art: Arc<dyn CardArtStore> = Arc::new(FsCardArtStore::new(config.card_art_dir.clone()));

    Fixture {
        state: AppState {
            config: Arc::new(config),
            catalog: Arc::new(RewardCatalog::standard()),
            gateway: Arc::new(gateway),
            history: Arc::new(InMemoryHistoryStore::new()),
            card_art,
            clock: Arc::new(March),
        },
        provider,
        _art_dir: art_dir,
    }
}

fn boosted_session(state: &AppState, generations: u32) -> PlayerSession {
    let mut boost = RarityBoostState::default();
    boost.apply_boost(25.0, generations);
    state.open_session(
        Uuid::new_v4(),
        Box::new(Fixed(0.41)),
        RewardSnapshot {
            boost,
            ..RewardSnapshot::default()
        },
    )
}

#[tokio::test]
async fn daily_spin_is_recorded_and_credited() {
    let fx = fixture(FakeProvider::ok());
    let session = fx
        .state
        .open_session(Uuid::new_v4(), Box::new(Fixed(0.41)), RewardSnapshot::default());

    for d in 1..=3 {
        let spin = session.daily_spin(day(d)).await.unwrap();
        assert_eq!(spin.result.outcome.reward_type, SpinRewardType::Coins);
        assert_eq!(spin.result.outcome.streak_day_at_spin, d);
        if d == 3 {
            // Day-three milestone pays 100 coins on top of the spin.
            assert_eq!(spin.grant.coins, u64::from(spin.result.outcome.amount) + 100);
        }
    }

    let history = fx.state.history.read_all().await.unwrap();
    let streak_days: Vec<u32> = history.iter().map(|o| o.streak_day_at_spin).collect();
    assert_eq!(streak_days, vec![1, 2, 3]);
    assert!(session.has_spun_on(day(3)).await);
    assert!(!session.has_spun_on(day(4)).await);
}

#[tokio::test]
async fn concurrent_spins_each_leave_one_history_entry() {
    let fx = fixture(FakeProvider::ok());
    let session = Arc::new(fx.state.open_session(
        Uuid::new_v4(),
        Box::new(Fixed(0.1)),
        RewardSnapshot::default(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            tokio::spawn(async move { session.daily_spin(day(1)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let history = fx.state.history.read_all().await.unwrap();
    assert_eq!(history.len(), 8);
    assert!(history.iter().all(|o| o.streak_day_at_spin == 1));
    assert_eq!(session.snapshot().await.streak.current_streak, 1);
}

#[tokio::test]
async fn failed_history_write_leaves_the_milestone_for_a_retry() {
    let history = Arc::new(FlakyHistory {
        down: AtomicBool::new(true),
        inner: InMemoryHistoryStore::new(),
    });
    let before = RewardSnapshot {
        streak: StreakState {
            current_streak: 2,
            last_active_day: Some(day(2)),
            protection_charges: 0,
        },
        last_spin_day: Some(day(2)),
        ..RewardSnapshot::default()
    };
    let engine = RewardEngine::restore(
        Arc::new(RewardCatalog::standard()),
        Box::new(Fixed(0.41)),
        Arc::new(March),
        before.clone(),
    );
    let session = PlayerSession::new(Uuid::new_v4(), engine, history.clone());

    let err = session.daily_spin(day(3)).await.unwrap_err();
    assert!(matches!(err, PortError::Unexpected(_)));
    assert_eq!(session.snapshot().await, before);
    assert!(!session.has_spun_on(day(3)).await);

    history.down.store(false, Ordering::SeqCst);
    let spin = session.daily_spin(day(3)).await.unwrap();
    assert_eq!(spin.result.outcome.streak_day_at_spin, 3);
    assert_eq!(
        spin.result.milestones_crossed.iter().map(|m| m.day).collect::<Vec<_>>(),
        vec![3]
    );
    assert_eq!(spin.grant.coins, u64::from(spin.result.outcome.amount) + 100);
    assert_eq!(history.read_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn forging_spends_one_boosted_generation_and_stores_the_art() {
    let fx = fixture(FakeProvider::ok());
    let session = boosted_session(&fx.state, 2);
    let forge = CardForge::new(
        fx.state.gateway.clone(),
        fx.state.card_art.clone(),
        RarityOdds::standard(),
        Box::new(Fixed(0.99)),
    );

    let card = forge
        .forge_card(
            &session,
            &ImagePrompt::new("a storm drake"),
            &GenerationParameters::default(),
            ProviderChoice::FlatPrompt,
        )
        .await
        .unwrap();

    assert_eq!(card.boost_percent, 25.0);
    assert_eq!(card.rarity, CardRarity::Legendary);
    assert_eq!(card.encoding, ImageEncoding::InlineBase64);
    assert_eq!(card.revised_prompt.as_deref(), Some("a storm drake, card art"));
    assert!(card.location.ends_with(&format!("{}.png", card.card_id)));
    assert_eq!(std::fs::read(&card.location).unwrap(), b"\x89PNG");

    let boost = session.snapshot().await.boost;
    assert!(boost.active);
    assert_eq!(boost.expires_after_generations, 1);
}

#[tokio::test]
async fn rejected_requests_keep_the_boost() {
    let fx = fixture(FakeProvider::ok());
    let session = boosted_session(&fx.state, 1);
    let forge = CardForge::from_state(&fx.state, Box::new(Fixed(0.5)));
    let params = GenerationParameters::default();

    let blank = forge
        .forge_card(&session, &ImagePrompt::new("   "), &params, ProviderChoice::FlatPrompt)
        .await
        .unwrap_err();
    assert!(matches!(
        blank,
        AppError::Generation(GatewayError::InvalidPrompt(_))
    ));

    let unconfigured = forge
        .forge_card(
            &session,
            &ImagePrompt::new("a storm drake"),
            &params,
            ProviderChoice::InstanceBased,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        unconfigured,
        AppError::Generation(GatewayError::ProviderNotConfigured(ProviderChoice::InstanceBased))
    ));

    assert_eq!(fx.provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.snapshot().await.boost.expires_after_generations, 1);
}

#[tokio::test]
async fn vendor_failures_surface_as_classified_generation_errors() {
    let fx = fixture(FakeProvider::failing(ProviderError::EmptyResult));
    let session = boosted_session(&fx.state, 1);
    let forge = CardForge::from_state(&fx.state, Box::new(Fixed(0.5)));

    let err = forge
        .forge_card(
            &session,
            &ImagePrompt::new("a storm drake"),
            &GenerationParameters::default(),
            ProviderChoice::FlatPrompt,
        )
        .await
        .unwrap_err();

    match err {
        AppError::Generation(gateway_err) => {
            assert_eq!(gateway_err.kind(), Some(GatewayErrorKind::NoContentReturned));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The attempt reached the vendor, so the boosted generation is spent.
    assert!(!session.snapshot().await.boost.active);
}
