//! Core traits for genre similarity resolution.
//!
//! This module defines the SimilarityStrategy trait that lets the
//! rank-based and embedding-based approaches be swapped by configuration.

use crate::error::SimilarityError;
use crate::random::RandomSource;
use async_trait::async_trait;
use catalog::GenreId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scores closer than this are treated as tied
pub const TIE_EPSILON: f64 = 1e-12;

/// Which similarity approach resolves a genre pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Rank,
    Embedding,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Rank => f.write_str("rank"),
            StrategyKind::Embedding => f.write_str("embedding"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rank" => Ok(StrategyKind::Rank),
            "embedding" => Ok(StrategyKind::Embedding),
            other => Err(format!(
                "unknown similarity strategy '{}' (expected 'rank' or 'embedding')",
                other
            )),
        }
    }
}

/// The genre that best bridges two seed genres
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreMatch {
    pub winner: GenreId,
    /// Higher is more similar. Rank scores lie in [0, 1], cosine scores in [-1, 1]
    pub score: f64,
    /// How many candidates shared the best score before the tie-break
    pub tied: usize,
}

/// Resolves two genres to a single most-similar genre.
///
/// ## Design Note
/// - `Send + Sync` so a strategy can be shared across concurrent requests
/// - Implementations read the catalog through the retry policy; exhausted
///   retries surface as `SimilarityError::Fetch`
#[async_trait]
pub trait SimilarityStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Find the genre most similar to both `genre_a` and `genre_b`.
    ///
    /// When the two genres differ, neither is eligible as the winner.
    async fn score(
        &self,
        genre_a: &GenreId,
        genre_b: &GenreId,
    ) -> Result<GenreMatch, SimilarityError>;
}

/// Genres that may not win for this pair
pub fn excluded_seeds(genre_a: &GenreId, genre_b: &GenreId) -> Vec<GenreId> {
    if genre_a == genre_b {
        Vec::new()
    } else {
        vec![genre_a.clone(), genre_b.clone()]
    }
}

/// Pick one of the tied best candidates.
///
/// Returns `None` only for an empty slice.
pub fn break_tie(
    random: &dyn RandomSource,
    candidates: Vec<GenreId>,
    score: f64,
) -> Option<GenreMatch> {
    let tied = candidates.len();
    let winner = crate::random::choose(random, &candidates)?.clone();
    Some(GenreMatch { winner, score, tied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("Rank".parse::<StrategyKind>(), Ok(StrategyKind::Rank));
        assert_eq!(" embedding ".parse::<StrategyKind>(), Ok(StrategyKind::Embedding));
        assert!("cosine".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::default().to_string(), "rank");
    }

    #[test]
    fn test_excluded_seeds() {
        let rock = GenreId::new("rock");
        let pop = GenreId::new("pop");
        assert_eq!(excluded_seeds(&rock, &pop), vec![rock.clone(), pop]);
        assert!(excluded_seeds(&rock, &rock.clone()).is_empty());
    }

    #[test]
    fn test_break_tie_uses_random_source() {
        let random = SequenceRandom::new([1]);
        let result = break_tie(
            &random,
            vec![GenreId::new("a"), GenreId::new("b"), GenreId::new("c")],
            0.5,
        )
        .unwrap();
        assert_eq!(result.winner, GenreId::new("b"));
        assert_eq!(result.tied, 3);

        assert!(break_tie(&random, Vec::new(), 0.5).is_none());
    }
}
