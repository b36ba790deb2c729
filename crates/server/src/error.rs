//! Failure taxonomy for a single recommendation.

use std::time::Duration;

use catalog::GenreId;
use fetcher::{is_permanent, RetryError};
use similarity::SimilarityError;
use thiserror::Error;

/// How a caller should treat a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The data needed for a match does not exist; retrying will not help
    NotFound,
    /// A collaborator failed transiently; the whole request may succeed later
    Upstream,
}

/// Why `recommend` produced no match. Every variant is terminal for the call.
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Seed '{seed}' has no genre association")]
    NoGenreAssociation { seed: String },

    #[error("No similarity data for '{genre_a}' + '{genre_b}': {source}")]
    NoSimilarityData {
        genre_a: GenreId,
        genre_b: GenreId,
        #[source]
        source: SimilarityError,
    },

    #[error("No artists mapped to genre '{genre}'")]
    NoArtistForGenre { genre: GenreId },

    #[error("No track found for artist '{artist}'")]
    NoTrackForArtist { artist: String },

    #[error("External service failure: {0}")]
    ExternalService(#[from] RetryError),

    #[error("Recommendation did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl RecommendError {
    /// Split a resolver failure into missing data and upstream failure
    pub fn from_similarity(genre_a: &GenreId, genre_b: &GenreId, err: SimilarityError) -> Self {
        match err {
            SimilarityError::Fetch(retry) => RecommendError::ExternalService(retry),
            source => RecommendError::NoSimilarityData {
                genre_a: genre_a.clone(),
                genre_b: genre_b.clone(),
                source,
            },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            RecommendError::NoGenreAssociation { .. }
            | RecommendError::NoSimilarityData { .. }
            | RecommendError::NoArtistForGenre { .. }
            | RecommendError::NoTrackForArtist { .. } => FailureKind::NotFound,
            // e.g. a 404 for an unknown track id
            RecommendError::ExternalService(retry) if is_permanent(&retry.last_error) => {
                FailureKind::NotFound
            }
            RecommendError::ExternalService(_) | RecommendError::DeadlineExceeded(_) => {
                FailureKind::Upstream
            }
        }
    }

    /// Whether repeating the whole request could succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Upstream
    }
}
