//! services/forge/src/error.rs
//!
//! Defines the primary error type for the forge runtime.

use crate::config::ConfigError;
use cardforge_core::{CatalogError, GatewayError, PortError};

/// The primary error type for the `forge` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The reward catalog failed validation at startup.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Represents an error that propagated up from one of the core store ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Image generation failed; the inner error says whether to retry.
    #[error("Generation error: {0}")]
    Generation(#[from] GatewayError),

    /// Represents a standard Input/Output error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
