//! Parser for JSON catalog documents.
//!
//! Format:
//! ```json
//! { "genres": [
//!     { "name": "rock",
//!       "similar": ["hard rock", "blues rock"],
//!       "embedding": [0.12, -0.03],
//!       "artists": ["The Rolling Stones"] }
//! ] }
//! ```
//! `similar`, `embedding` and `artists` are all optional. An empty
//! embedding array counts as "no embedding".

use crate::error::{CatalogError, Result};
use crate::types::Genre;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    genres: Vec<GenreEntry>,
}

#[derive(Debug, Deserialize)]
struct GenreEntry {
    name: String,
    #[serde(default)]
    similar: Option<Vec<String>>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    artists: Vec<String>,
}

/// Parse a catalog document held in memory
pub fn parse_catalog(json: &str) -> Result<Vec<Genre>> {
    let document: CatalogDocument = serde_json::from_str(json)?;

    document
        .genres
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| parse_entry(idx + 1, entry))
        .collect()
}

/// Read and parse a catalog file
pub fn read_catalog_file(path: &Path) -> Result<Vec<Genre>> {
    let json = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => CatalogError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CatalogError::IoError(err),
    })?;
    parse_catalog(&json)
}

fn parse_entry(entry_no: usize, entry: GenreEntry) -> Result<Genre> {
    if entry.name.trim().is_empty() {
        return Err(CatalogError::ParseError {
            entry: entry_no,
            reason: "Missing genre name".to_string(),
        });
    }

    let mut genre = Genre::new(entry.name.as_str());

    if let Some(similar) = entry.similar {
        genre = genre.with_rank_list(similar);
    }

    if let Some(embedding) = entry.embedding.filter(|values| !values.is_empty()) {
        if let Some(position) = embedding.iter().position(|v| !v.is_finite()) {
            return Err(CatalogError::InvalidEmbedding {
                genre: genre.id.to_string(),
                reason: format!("non-finite value at index {}", position),
            });
        }
        genre = genre.with_embedding(embedding);
    }

    Ok(genre.with_artists(entry.artists))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenreId;

    #[test]
    fn test_parse_full_entry() {
        let json = r#"{"genres": [
            {"name": "Rock", "similar": ["Hard Rock", "Blues"], "embedding": [0.5, 0.5],
             "artists": ["AC/DC", "Queen feat. David Bowie"]}
        ]}"#;

        let genres = parse_catalog(json).unwrap();
        assert_eq!(genres.len(), 1);

        let rock = &genres[0];
        assert_eq!(rock.id, GenreId::new("rock"));
        assert_eq!(
            rock.representation.rank_list.as_deref(),
            Some(&[GenreId::new("hard rock"), GenreId::new("blues")][..])
        );
        assert_eq!(rock.representation.embedding, Some(vec![0.5, 0.5]));
        assert_eq!(rock.artists, vec!["AC/DC", "Queen", "David Bowie"]);
    }

    #[test]
    fn test_parse_sparse_entry() {
        let genres = parse_catalog(r#"{"genres": [{"name": "drone", "embedding": []}]}"#).unwrap();
        assert!(genres[0].representation.is_empty());
        assert!(genres[0].artists.is_empty());
    }

    #[test]
    fn test_parse_missing_name() {
        let result = parse_catalog(r#"{"genres": [{"name": "ok"}, {"name": "  "}]}"#);
        assert!(matches!(result, Err(CatalogError::ParseError { entry: 2, .. })));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(parse_catalog("genres: []"), Err(CatalogError::JsonError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = read_catalog_file(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(CatalogError::FileNotFound { .. })));
    }
}
