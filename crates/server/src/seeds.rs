//! Resolution of seed tracks to candidate genre sets.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use catalog::{GenreCatalog, GenreId};
use fetcher::{RetryError, RetryingFetcher};
use serde::{Deserialize, Serialize};
use tracing::debug;
use upstream::SeedTrack;

/// Where a seed's genres come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedGenreSource {
    /// Genre tags the music API attaches to the seed's artists, limited to
    /// genres the catalog knows
    #[default]
    ArtistMetadata,
    /// The catalog's own artist -> genre membership
    CatalogArtists,
}

impl fmt::Display for SeedGenreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedGenreSource::ArtistMetadata => f.write_str("artist_metadata"),
            SeedGenreSource::CatalogArtists => f.write_str("catalog_artists"),
        }
    }
}

/// Normalize raw tags, dropping empties and repeats (first occurrence wins)
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<GenreId> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(GenreId::new)
        .filter(|genre| !genre.is_empty())
        .filter(|genre| seen.insert(genre.clone()))
        .collect()
}

/// Turns a fetched seed track into the genres it may be sampled from.
#[derive(Clone)]
pub struct SeedResolver {
    catalog: Arc<dyn GenreCatalog>,
    fetcher: RetryingFetcher,
    source: SeedGenreSource,
}

impl SeedResolver {
    pub fn new(catalog: Arc<dyn GenreCatalog>, fetcher: RetryingFetcher, source: SeedGenreSource) -> Self {
        Self {
            catalog,
            fetcher,
            source,
        }
    }

    pub fn source(&self) -> SeedGenreSource {
        self.source
    }

    /// Whether the seed carries anything to look up. A seed without
    /// candidates resolves to no genres without touching the catalog.
    pub fn has_candidates(&self, track: &SeedTrack) -> bool {
        match self.source {
            SeedGenreSource::ArtistMetadata => !normalize_tags(&track.genres).is_empty(),
            SeedGenreSource::CatalogArtists => track.artist_names().any(|name| !name.trim().is_empty()),
        }
    }

    /// Candidate genres of a seed, in first-seen order
    pub async fn seed_genres(&self, track: &SeedTrack) -> Result<Vec<GenreId>, RetryError> {
        if !self.has_candidates(track) {
            debug!("Seed '{}' carries no {} to look up", track.id, self.source);
            return Ok(Vec::new());
        }

        let genres = match self.source {
            SeedGenreSource::ArtistMetadata => {
                let tags = normalize_tags(&track.genres);
                self.fetcher
                    .run("known_genres", || self.catalog.known_genres(&tags))
                    .await?
            }
            SeedGenreSource::CatalogArtists => {
                let mut seen = HashSet::new();
                let mut genres = Vec::new();
                for artist in track.artist_names().filter(|name| !name.trim().is_empty()) {
                    let found = self
                        .fetcher
                        .run("genres_for_artist", || self.catalog.genres_for_artist(artist))
                        .await?;
                    genres.extend(found.into_iter().filter(|genre| seen.insert(genre.clone())));
                }
                genres
            }
        };

        debug!(
            "Seed '{}' resolved to {} genres via {}",
            track.id,
            genres.len(),
            self.source
        );
        Ok(genres)
    }
}
