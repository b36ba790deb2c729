//! Core domain types for the genre catalog.
//!
//! A genre is known by its canonical (trimmed, lowercase) name. Each genre may
//! carry a rank list of similar genres, a fixed-dimension embedding, both, or
//! neither; artists are attached by membership only.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Canonical genre identifier.
///
/// Construction always normalizes, so two `GenreId`s compare equal exactly
/// when their names match case-insensitively (ignoring surrounding spaces).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct GenreId(String);

impl GenreId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for GenreId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for GenreId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<GenreId> for String {
    fn from(id: GenreId) -> Self {
        id.0
    }
}

impl AsRef<str> for GenreId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artist display name. Many artists share one genre.
pub type ArtistName = String;

/// Fixed-length numeric genre embedding
pub type Embedding = Vec<f32>;

// =============================================================================
// Genre data
// =============================================================================

/// Whatever similarity data the catalog holds for one genre.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreRepresentation {
    /// Other genres, most similar first. Never contains the genre itself
    /// and never contains duplicates.
    pub rank_list: Option<Vec<GenreId>>,
    pub embedding: Option<Embedding>,
}

impl GenreRepresentation {
    /// True when neither representation is populated
    pub fn is_empty(&self) -> bool {
        self.rank_list.is_none() && self.embedding.is_none()
    }
}

/// A genre together with its representation and member artists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub representation: GenreRepresentation,
    pub artists: Vec<ArtistName>,
}

impl Genre {
    pub fn new(id: impl Into<GenreId>) -> Self {
        Self {
            id: id.into(),
            representation: GenreRepresentation::default(),
            artists: Vec::new(),
        }
    }

    /// Attach a rank list; self references and duplicates are dropped.
    pub fn with_rank_list<I, G>(mut self, similar: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GenreId>,
    {
        let cleaned = clean_rank_list(&self.id, similar.into_iter().map(Into::into));
        self.representation.rank_list = Some(cleaned);
        self
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.representation.embedding = Some(embedding);
        self
    }

    /// Attach member artists. "A feat. B" credits count as both artists.
    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self.artists.iter().map(|a| a.to_lowercase()).collect();
        for credit in artists {
            for name in split_featured_artists(credit.as_ref()) {
                if seen.insert(name.to_lowercase()) {
                    self.artists.push(name);
                }
            }
        }
        self
    }
}

/// Normalize a raw rank list against its anchor genre.
///
/// Keeps first occurrences only and removes empty names and the anchor.
pub fn clean_rank_list(anchor: &GenreId, similar: impl IntoIterator<Item = GenreId>) -> Vec<GenreId> {
    let mut seen = HashSet::new();
    similar
        .into_iter()
        .filter(|genre| !genre.is_empty() && genre != anchor)
        .filter(|genre| seen.insert(genre.clone()))
        .collect()
}

/// Split an artist credit such as "Alice feat. Bob" into individual names.
pub fn split_featured_artists(credit: &str) -> Vec<ArtistName> {
    // ASCII lowering keeps byte offsets aligned with the original string
    let lowered = credit.to_ascii_lowercase();
    let mut names = Vec::new();
    let mut rest_start = 0;
    let mut cursor = 0;

    while cursor < lowered.len() {
        let tail = &lowered[cursor..];
        let marker_len = if tail.starts_with("featuring") {
            "featuring".len()
        } else if tail.starts_with("feat.") {
            "feat.".len()
        } else {
            0
        };

        if marker_len > 0 {
            names.push(credit[rest_start..cursor].trim().to_string());
            cursor += marker_len;
            rest_start = cursor;
        } else {
            cursor += tail.chars().next().map_or(1, char::len_utf8);
        }
    }
    names.push(credit[rest_start..].trim().to_string());

    names.retain(|name| !name.is_empty());
    names
}
