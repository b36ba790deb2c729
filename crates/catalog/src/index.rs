//! In-memory catalog index.
//!
//! Builds the lookups the resolver needs from a list of genres:
//! - genre id -> genre (representation + artists)
//! - artist -> genres (inverse membership index)
//! - stable insertion order for iterating embeddings

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::traits::GenreCatalog;
use crate::types::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Catalog held entirely in memory.
///
/// Read-only once built; share it behind an `Arc` without any locking.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    pub(crate) genres: HashMap<GenreId, Genre>,
    /// Insertion order, so embedding scans are deterministic
    pub(crate) order: Vec<GenreId>,
    /// Lowercased artist name -> genres the artist belongs to
    pub(crate) artist_genres: HashMap<String, Vec<GenreId>>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON catalog file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading genre catalog from {:?}", path);
        let genres = parser::read_catalog_file(path)?;
        let index = Self::from_genres(genres)?;

        let (genres, ranked, embedded, artists) = index.counts();
        info!(
            "Loaded {} genres ({} with rank lists, {} with embeddings), {} artists",
            genres, ranked, embedded, artists
        );
        Ok(index)
    }

    /// Parse and validate a JSON catalog held in memory
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_genres(parser::parse_catalog(json)?)
    }

    /// Build a validated index from already constructed genres
    pub fn from_genres(genres: impl IntoIterator<Item = Genre>) -> Result<Self> {
        let mut index = Self::new();
        for genre in genres {
            index.insert_genre(genre);
        }
        index.validate()?;
        Ok(index)
    }

    /// Insert (or replace) a genre and update the artist index
    pub fn insert_genre(&mut self, genre: Genre) {
        if let Some(previous) = self.genres.remove(&genre.id) {
            debug!("Replacing catalog entry for genre '{}'", previous.id);
            for artist in &previous.artists {
                if let Some(genres) = self.artist_genres.get_mut(&artist.to_lowercase()) {
                    genres.retain(|g| g != &previous.id);
                }
            }
            self.artist_genres.retain(|_, genres| !genres.is_empty());
        } else {
            self.order.push(genre.id.clone());
        }

        for artist in &genre.artists {
            self.artist_genres
                .entry(artist.to_lowercase())
                .or_default()
                .push(genre.id.clone());
        }
        self.genres.insert(genre.id.clone(), genre);
    }

    pub fn get_genre(&self, id: &GenreId) -> Option<&Genre> {
        self.genres.get(id)
    }

    pub fn contains(&self, id: &GenreId) -> bool {
        self.genres.contains_key(id)
    }

    /// Artists mapped to a genre, empty slice if none
    pub fn get_artists(&self, id: &GenreId) -> &[ArtistName] {
        self.genres
            .get(id)
            .map(|g| g.artists.as_slice())
            .unwrap_or(&[])
    }

    /// Genres an artist belongs to (case-insensitive), empty slice if none
    pub fn get_artist_genres(&self, artist: &str) -> &[GenreId] {
        self.artist_genres
            .get(&artist.trim().to_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Genres with embeddings, in insertion order
    pub fn embeddings(&self) -> impl Iterator<Item = (&GenreId, &Embedding)> {
        self.order.iter().filter_map(|id| {
            self.genres
                .get(id)
                .and_then(|g| g.representation.embedding.as_ref())
                .map(|embedding| (id, embedding))
        })
    }

    /// Dimension shared by all embeddings, if any genre has one
    pub fn embedding_dimension(&self) -> Option<usize> {
        self.embeddings().next().map(|(_, e)| e.len())
    }

    /// All genre ids in insertion order
    pub fn genre_ids(&self) -> &[GenreId] {
        &self.order
    }

    /// (genres, with rank list, with embedding, distinct artists)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let ranked = self
            .genres
            .values()
            .filter(|g| g.representation.rank_list.is_some())
            .count();
        let embedded = self.embeddings().count();
        (self.genres.len(), ranked, embedded, self.artist_genres.len())
    }

    /// Check catalog-wide invariants
    ///
    /// - every embedding has the same dimension
    /// - no embedding is all zeros (cosine similarity is undefined there)
    pub fn validate(&self) -> Result<()> {
        let mut expected: Option<usize> = None;

        for (id, embedding) in self.embeddings() {
            let dims = embedding.len();
            match expected {
                None => expected = Some(dims),
                Some(expected) if expected != dims => {
                    return Err(CatalogError::InconsistentDimensions {
                        genre: id.to_string(),
                        expected,
                        found: dims,
                    });
                }
                Some(_) => {}
            }

            if embedding.iter().all(|v| *v == 0.0) {
                return Err(CatalogError::InvalidEmbedding {
                    genre: id.to_string(),
                    reason: "zero vector".to_string(),
                });
            }
        }

        if self.genres.len() != self.order.len() {
            return Err(CatalogError::ValidationError(format!(
                "genre map has {} entries but order has {}",
                self.genres.len(),
                self.order.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl GenreCatalog for CatalogIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn genre_representation(
        &self,
        genre: &GenreId,
    ) -> anyhow::Result<Option<GenreRepresentation>> {
        Ok(self.get_genre(genre).map(|g| g.representation.clone()))
    }

    async fn all_embeddings(&self) -> anyhow::Result<Vec<(GenreId, Embedding)>> {
        Ok(self
            .embeddings()
            .map(|(id, embedding)| (id.clone(), embedding.clone()))
            .collect())
    }

    async fn artists_for_genre(&self, genre: &GenreId) -> anyhow::Result<Vec<ArtistName>> {
        Ok(self.get_artists(genre).to_vec())
    }

    async fn genres_for_artist(&self, artist: &str) -> anyhow::Result<Vec<GenreId>> {
        Ok(self.get_artist_genres(artist).to_vec())
    }

    async fn known_genres(&self, genres: &[GenreId]) -> anyhow::Result<Vec<GenreId>> {
        Ok(genres.iter().filter(|g| self.contains(g)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> CatalogIndex {
        CatalogIndex::from_genres(vec![
            Genre::new("rock")
                .with_rank_list(["hard rock", "blues"])
                .with_embedding(vec![1.0, 0.0])
                .with_artists(["Queen", "AC/DC"]),
            Genre::new("blues")
                .with_embedding(vec![0.0, 1.0])
                .with_artists(["B.B. King", "queen"]),
            Genre::new("drone"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_by_normalized_id() {
        let index = sample_index();
        assert!(index.contains(&GenreId::new("ROCK")));
        assert_eq!(index.get_artists(&GenreId::new("Rock")), ["Queen", "AC/DC"]);
        assert!(index.get_artists(&GenreId::new("jazz")).is_empty());
    }

    #[test]
    fn test_artist_inverse_index() {
        let index = sample_index();
        assert_eq!(
            index.get_artist_genres("QUEEN"),
            [GenreId::new("rock"), GenreId::new("blues")]
        );
        assert!(index.get_artist_genres("Nobody").is_empty());
    }

    #[test]
    fn test_replacing_genre_updates_artist_index() {
        let mut index = sample_index();
        index.insert_genre(Genre::new("rock").with_artists(["Led Zeppelin"]));

        assert!(index.get_artist_genres("ac/dc").is_empty());
        assert_eq!(index.get_artist_genres("led zeppelin"), [GenreId::new("rock")]);
        assert_eq!(index.genre_ids().len(), 3);
    }

    #[test]
    fn test_embeddings_keep_insertion_order() {
        let index = sample_index();
        let ids: Vec<_> = index.embeddings().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["rock", "blues"]);
        assert_eq!(index.embedding_dimension(), Some(2));
        assert_eq!(index.counts(), (3, 1, 2, 3));
    }

    #[test]
    fn test_validate_rejects_mixed_dimensions() {
        let result = CatalogIndex::from_genres(vec![
            Genre::new("a").with_embedding(vec![1.0, 0.0]),
            Genre::new("b").with_embedding(vec![1.0, 0.0, 0.0]),
        ]);
        assert!(matches!(
            result,
            Err(CatalogError::InconsistentDimensions { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_vector() {
        let result = CatalogIndex::from_genres(vec![Genre::new("a").with_embedding(vec![0.0, 0.0])]);
        assert!(matches!(result, Err(CatalogError::InvalidEmbedding { .. })));
    }

    #[tokio::test]
    async fn test_catalog_trait_queries() {
        let index = sample_index();

        let rep = index.genre_representation(&GenreId::new("rock")).await.unwrap().unwrap();
        assert_eq!(rep.rank_list.unwrap().len(), 2);
        assert!(index.genre_representation(&GenreId::new("jazz")).await.unwrap().is_none());

        let known = index
            .known_genres(&[GenreId::new("jazz"), GenreId::new("blues"), GenreId::new("rock")])
            .await
            .unwrap();
        assert_eq!(known, vec![GenreId::new("blues"), GenreId::new("rock")]);

        assert_eq!(index.all_embeddings().await.unwrap().len(), 2);
    }
}
