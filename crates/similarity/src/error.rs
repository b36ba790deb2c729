//! Error types for similarity resolution.

use catalog::GenreId;
use fetcher::RetryError;
use std::fmt;
use thiserror::Error;

/// Which genre representation a strategy needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    RankList,
    Embedding,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::RankList => f.write_str("rank list"),
            Representation::Embedding => f.write_str("embedding"),
        }
    }
}

/// Why two genres could not be resolved to a winner
#[derive(Error, Debug)]
pub enum SimilarityError {
    /// The catalog lacks the representation the strategy works on
    #[error("Genre '{genre}' has no {representation} in the catalog")]
    MissingRepresentation {
        genre: GenreId,
        representation: Representation,
    },

    /// A rank list holding only its anchor has no finite normalized rank
    #[error("Rank list for '{genre}' contains no genres besides itself")]
    DegenerateRankList { genre: GenreId },

    /// The two rank lists share no eligible genre
    #[error("Rank lists of '{genre_a}' and '{genre_b}' share no candidate genre")]
    NoOverlap { genre_a: GenreId, genre_b: GenreId },

    /// No catalog embedding could be compared against the seed average
    #[error("No catalog embedding is comparable with '{genre_a}' + '{genre_b}'")]
    NoEmbeddingCandidates { genre_a: GenreId, genre_b: GenreId },

    #[error("Embedding for '{genre}' has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        genre: GenreId,
        expected: usize,
        found: usize,
    },

    /// The catalog could not be reached within the retry budget
    #[error(transparent)]
    Fetch(#[from] RetryError),
}

impl SimilarityError {
    /// True when the catalog answered but had nothing comparable.
    /// False for upstream failures.
    pub fn is_missing_data(&self) -> bool {
        !matches!(self, SimilarityError::Fetch(_))
    }
}
