//! Client for the external music API.
//!
//! This crate provides:
//! - The `MusicApi` contract the orchestrator consumes
//! - Track and seed payload types
//! - `SpotifyClient`, an HTTP implementation against the Spotify Web API
//!
//! Transient failures (transport errors, 5xx, 429) are returned as plain
//! errors so the caller's retry policy can try again; client errors are
//! marked permanent.
//!
//! ## Example Usage
//! ```ignore
//! use upstream::{MusicApi, SpotifyClient, SpotifyConfig};
//!
//! let client = SpotifyClient::new(SpotifyConfig {
//!     access_token: std::env::var("SPOTIFY_ACCESS_TOKEN")?,
//!     ..SpotifyConfig::default()
//! })?;
//! let seed = client.fetch_seed_track("4uLU6hMCjMI75M1A2tKUQC").await?;
//! println!("{} genres: {:?}", seed.name, seed.genres);
//! ```

pub mod error;
pub mod spotify;
pub mod traits;
pub mod types;

pub use error::UpstreamError;
pub use spotify::{SpotifyClient, SpotifyConfig};
pub use traits::MusicApi;
pub use types::{Album, ArtistRef, Image, SeedTrack, Track};
