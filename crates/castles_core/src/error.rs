//! Error types for the battle simulation.
//!
//! Most in-match "errors" are policy rejections (duplicate producer,
//! stale draft pick, bad slot index) and are reported as `bool` returns
//! rather than raised; [`SimError`] covers genuine faults such as bad
//! catalog data or an invalid configuration.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for simulation setup and data loading.
#[derive(Debug, Error)]
pub enum SimError {
    /// Unknown archetype identifier.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Catalog contains duplicate archetype identifiers.
    #[error("Duplicate archetype in catalog: {0}")]
    DuplicateArchetype(String),

    /// Catalog has no archetypes at all.
    #[error("Unit catalog is empty")]
    EmptyCatalog,

    /// Data file parsing error.
    #[error("Failed to parse roster data: {0}")]
    RosterParseError(#[from] ron::error::SpannedError),

    /// Invalid configuration value.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
