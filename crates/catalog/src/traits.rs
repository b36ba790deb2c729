//! Query contract for genre catalogs.
//!
//! The resolver and orchestrator only ever see a catalog through this trait,
//! so an in-memory index and a database-backed store are interchangeable.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ArtistName, Embedding, GenreId, GenreRepresentation};

/// Read-only lookup surface over genre metadata.
///
/// ## Design Note
/// - `Send + Sync` so one catalog can serve concurrent requests behind an `Arc`
/// - Every call may cross a process boundary, so all of them are async and
///   fallible; callers wrap them in a retry policy
#[async_trait]
pub trait GenreCatalog: Send + Sync {
    /// Short name of the backing store (for logging)
    fn name(&self) -> &str;

    /// Rank list and/or embedding for one genre.
    ///
    /// `Ok(None)` means the catalog does not know the genre at all.
    async fn genre_representation(&self, genre: &GenreId) -> Result<Option<GenreRepresentation>>;

    /// Every genre that has an embedding, in stable catalog order
    async fn all_embeddings(&self) -> Result<Vec<(GenreId, Embedding)>>;

    /// Artists that belong to a genre (empty if none or unknown)
    async fn artists_for_genre(&self, genre: &GenreId) -> Result<Vec<ArtistName>>;

    /// Genres an artist belongs to, matched case-insensitively
    async fn genres_for_artist(&self, artist: &str) -> Result<Vec<GenreId>>;

    /// The subset of `genres` this catalog knows, in input order
    async fn known_genres(&self, genres: &[GenreId]) -> Result<Vec<GenreId>>;

    /// Release any held resources. Called once on shutdown.
    async fn close(&self) {}
}
