//! Server crate for the song-match recommendation engine.
//!
//! This crate contains the orchestrator that turns two seed tracks into a
//! recommended third track, plus everything needed to run it: seed genre
//! resolution, the failure taxonomy, configuration and collaborator
//! lifecycle.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod seeds;

pub use bootstrap::{open_catalog, Engine};
pub use config::{CatalogConfig, ConfigError, EngineConfig, RetryConfig, UpstreamConfig};
pub use error::{FailureKind, RecommendError};
pub use orchestrator::{MatchResult, RecommendationOrchestrator};
pub use seeds::{normalize_tags, SeedGenreSource, SeedResolver};
