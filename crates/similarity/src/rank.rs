//! Rank-list similarity.
//!
//! Each genre's rank list is anchored (the genre itself at index 0, its
//! similar genres after it). A genre at index `i` of a list of length `n`
//! has normalized rank `i / (n - 1)`; a candidate present in both lists
//! scores `1 - (rank_a + rank_b) / 2`.

use crate::error::{Representation, SimilarityError};
use crate::random::RandomSource;
use crate::traits::{break_tie, excluded_seeds, GenreMatch, SimilarityStrategy, StrategyKind, TIE_EPSILON};
use async_trait::async_trait;
use catalog::{clean_rank_list, GenreCatalog, GenreId};
use fetcher::RetryingFetcher;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// `anchor` followed by its cleaned similar genres
pub fn anchored_rank_list(anchor: &GenreId, similar: &[GenreId]) -> Vec<GenreId> {
    let mut list = Vec::with_capacity(similar.len() + 1);
    list.push(anchor.clone());
    list.extend(clean_rank_list(anchor, similar.iter().cloned()));
    list
}

/// Position of `genre` scaled into [0, 1]. `None` if absent or the list is
/// too short to scale.
pub fn normalized_rank(list: &[GenreId], genre: &GenreId) -> Option<f64> {
    if list.len() < 2 {
        return None;
    }
    let index = list.iter().position(|g| g == genre)?;
    Some(index as f64 / (list.len() - 1) as f64)
}

/// Combined score of a genre present in both lists
pub fn rank_score(genre: &GenreId, list_a: &[GenreId], list_b: &[GenreId]) -> Option<f64> {
    let rank_a = normalized_rank(list_a, genre)?;
    let rank_b = normalized_rank(list_b, genre)?;
    Some(1.0 - (rank_a + rank_b) / 2.0)
}

/// All genres sharing the best combined score, in `list_a` order, plus that
/// score. Genres in `excluded` never qualify.
pub fn best_rank_candidates(
    list_a: &[GenreId],
    list_b: &[GenreId],
    excluded: &[GenreId],
) -> Result<(Vec<GenreId>, f64), SimilarityError> {
    for list in [list_a, list_b] {
        if list.len() < 2 {
            return Err(SimilarityError::DegenerateRankList {
                genre: list.first().cloned().unwrap_or_else(|| GenreId::new("")),
            });
        }
    }

    let scale_a = (list_a.len() - 1) as f64;
    let scale_b = (list_b.len() - 1) as f64;
    let positions_b: HashMap<&GenreId, usize> = list_b
        .iter()
        .enumerate()
        .rev()
        .map(|(index, genre)| (genre, index))
        .collect();

    let mut best: Vec<GenreId> = Vec::new();
    let mut best_score = f64::NEG_INFINITY;

    for (index_a, genre) in list_a.iter().enumerate() {
        if excluded.contains(genre) || best.contains(genre) {
            continue;
        }
        let Some(&index_b) = positions_b.get(genre) else {
            continue;
        };

        let score = 1.0 - (index_a as f64 / scale_a + index_b as f64 / scale_b) / 2.0;
        if score > best_score + TIE_EPSILON {
            best_score = score;
            best.clear();
            best.push(genre.clone());
        } else if (score - best_score).abs() <= TIE_EPSILON {
            best.push(genre.clone());
        }
    }

    if best.is_empty() {
        return Err(SimilarityError::NoOverlap {
            genre_a: list_a[0].clone(),
            genre_b: list_b[0].clone(),
        });
    }
    Ok((best, best_score))
}

/// Resolves genre pairs through their catalog rank lists.
pub struct RankStrategy {
    catalog: Arc<dyn GenreCatalog>,
    fetcher: RetryingFetcher,
    random: Arc<dyn RandomSource>,
}

impl RankStrategy {
    pub fn new(
        catalog: Arc<dyn GenreCatalog>,
        fetcher: RetryingFetcher,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            random,
        }
    }

    /// Anchored rank list of one genre, read through the retry policy
    async fn fetch_rank_list(&self, genre: &GenreId) -> Result<Vec<GenreId>, SimilarityError> {
        let representation = self
            .fetcher
            .run("genre_representation", || self.catalog.genre_representation(genre))
            .await?;

        let similar = representation.and_then(|r| r.rank_list).ok_or_else(|| {
            SimilarityError::MissingRepresentation {
                genre: genre.clone(),
                representation: Representation::RankList,
            }
        })?;

        let list = anchored_rank_list(genre, &similar);
        debug!("Rank list for '{}' has {} entries", genre, list.len());
        Ok(list)
    }
}

#[async_trait]
impl SimilarityStrategy for RankStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rank
    }

    #[instrument(skip(self), fields(strategy = "rank"))]
    async fn score(
        &self,
        genre_a: &GenreId,
        genre_b: &GenreId,
    ) -> Result<GenreMatch, SimilarityError> {
        let (list_a, list_b) = tokio::try_join!(
            self.fetch_rank_list(genre_a),
            self.fetch_rank_list(genre_b)
        )?;

        let excluded = excluded_seeds(genre_a, genre_b);
        let (candidates, score) = best_rank_candidates(&list_a, &list_b, &excluded)?;

        let result = break_tie(self.random.as_ref(), candidates, score).ok_or_else(|| {
            SimilarityError::NoOverlap {
                genre_a: genre_a.clone(),
                genre_b: genre_b.clone(),
            }
        })?;

        info!(
            "Rank match for '{}' + '{}': '{}' (score {:.4}, {} tied)",
            genre_a, genre_b, result.winner, result.score, result.tied
        );
        Ok(result)
    }
}
