//! # Catalog Crate
//!
//! Read-only genre metadata: per-genre similarity rank lists, genre
//! embeddings and genre -> artist membership.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (GenreId, Genre, GenreRepresentation)
//! - **traits**: The `GenreCatalog` query contract every backend implements
//! - **parser**: Parse JSON catalog documents
//! - **index**: In-memory `CatalogIndex` built from a parsed document
//! - **sqlite**: `SqliteCatalog` querying an existing SQLite database
//! - **error**: Error types for loading and querying
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogIndex, GenreCatalog, GenreId};
//! use std::path::Path;
//!
//! let index = CatalogIndex::load_from_file(Path::new("data/catalog.json"))?;
//! let artists = index.artists_for_genre(&GenreId::new("Trip Hop")).await?;
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod traits;
pub mod parser;
pub mod index;
pub mod sqlite;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use index::CatalogIndex;
pub use sqlite::SqliteCatalog;
pub use traits::GenreCatalog;
pub use types::{
    clean_rank_list, split_featured_artists, ArtistName, Embedding, Genre, GenreId,
    GenreRepresentation,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_index_creation() {
        let index = CatalogIndex::new();
        assert_eq!(index.counts(), (0, 0, 0, 0));
        assert!(index.embedding_dimension().is_none());
    }

    #[test]
    fn test_load_from_json_str() {
        let index = CatalogIndex::from_json_str(
            r#"{"genres": [
                {"name": "Trip Hop", "similar": ["downtempo"], "artists": ["Portishead"]},
                {"name": "downtempo", "similar": ["trip hop"]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(index.counts(), (2, 2, 0, 1));
        assert_eq!(index.get_artists(&GenreId::new("trip hop")), ["Portishead"]);
    }

    #[test]
    fn test_empty_queries() {
        let index = CatalogIndex::new();
        let genre = GenreId::new("anything");

        assert!(index.get_genre(&genre).is_none());
        assert!(index.get_artists(&genre).is_empty());
        assert!(index.get_artist_genres("nobody").is_empty());
        assert_eq!(index.embeddings().count(), 0);
    }
}
