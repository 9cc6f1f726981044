//! crates/cardforge_core/src/ports.rs
//!
//! Defines the collaborator contracts (traits) consumed by the core.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! gateway and the reward engine independent of HTTP stacks, clocks, random
//! number generators and storage media.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{GeneratedImage, SpinOutcome};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for store port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Transport
//=========================================================================================

/// Where a provider request goes, plus the headers it needs (auth, content type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Failures reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success status. `body` is the raw response text.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request timed out")]
    Timeout,
    #[error("network failure: {0}")]
    Network(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a JSON request body and returns the raw success body.
    async fn send(&self, endpoint: &Endpoint, body: Bytes) -> Result<Bytes, TransportError>;
}

//=========================================================================================
// Stores
//=========================================================================================

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, outcome: &SpinOutcome) -> PortResult<()>;

    /// All outcomes, oldest first.
    async fn read_all(&self) -> PortResult<Vec<SpinOutcome>>;
}

#[async_trait]
pub trait CardArtStore: Send + Sync {
    /// Persists the artwork for `card_id` and returns where it ended up.
    async fn store(&self, card_id: Uuid, image: GeneratedImage) -> PortResult<String>;
}

//=========================================================================================
// Time and Randomness
//=========================================================================================

pub trait Clock: Send + Sync {
    /// The player's current calendar day.
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomSource: Send {
    /// A uniform sample in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;
}
