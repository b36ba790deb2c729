//! Contract for the external music API.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{SeedTrack, Track};

/// Track and artist lookups against a streaming provider.
///
/// Errors that retrying cannot fix carry the `fetcher::PermanentError`
/// marker; everything else is treated as transient by the caller.
#[async_trait]
pub trait MusicApi: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// A seed track plus the genre tags of all its artists
    async fn fetch_seed_track(&self, track_id: &str) -> Result<SeedTrack>;

    /// One representative track for an artist, `None` if the artist or
    /// their tracks cannot be found
    async fn find_artist_track(&self, artist: &str) -> Result<Option<Track>>;

    /// Free-text track search, limited to hits usable as seeds: each carries
    /// its artists' genre tags and hits without any tags are dropped
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<SeedTrack>>;
}
