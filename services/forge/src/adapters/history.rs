//! services/forge/src/adapters/history.rs
//!
//! Process-local spin history. Durable storage belongs to the host app, which
//! can supply its own `HistoryStore`.

use async_trait::async_trait;
use cardforge_core::domain::SpinOutcome;
use cardforge_core::ports::{HistoryStore, PortResult};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryHistoryStore {
    outcomes: RwLock<Vec<SpinOutcome>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, outcome: &SpinOutcome) -> PortResult<()> {
        self.outcomes.write().await.push(outcome.clone());
        Ok(())
    }

    async fn read_all(&self) -> PortResult<Vec<SpinOutcome>> {
        Ok(self.outcomes.read().await.clone())
    }
}
