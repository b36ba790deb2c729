//! Embedding similarity.
//!
//! The two seed embeddings are averaged component-wise and every catalog
//! embedding is ranked by cosine similarity to that average.

use crate::error::{Representation, SimilarityError};
use crate::random::RandomSource;
use crate::traits::{break_tie, excluded_seeds, GenreMatch, SimilarityStrategy, StrategyKind, TIE_EPSILON};
use async_trait::async_trait;
use catalog::{Embedding, GenreCatalog, GenreId};
use fetcher::RetryingFetcher;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Cosine similarity in [-1, 1].
///
/// `None` when the lengths differ, the vectors are empty, or either has
/// zero magnitude.
pub fn cosine_similarity<A, B>(a: &[A], b: &[B]) -> Option<f64>
where
    A: Copy + Into<f64>,
    B: Copy + Into<f64>,
{
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x.into(), y.into());
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Component-wise mean of two equally sized embeddings
pub fn average_embedding(a: &[f32], b: &[f32]) -> Vec<f64> {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (f64::from(x) + f64::from(y)) / 2.0)
        .collect()
}

/// All genres sharing the best cosine similarity to `target`, in catalog
/// order, plus that similarity. Returns `None` when nothing is comparable.
pub fn best_embedding_candidates(
    target: &[f64],
    catalog: &[(GenreId, Embedding)],
    excluded: &[GenreId],
) -> Option<(Vec<GenreId>, f64)> {
    let mut best: Vec<GenreId> = Vec::new();
    let mut best_score = f64::NEG_INFINITY;
    let mut skipped = 0usize;

    for (genre, embedding) in catalog {
        if excluded.contains(genre) {
            continue;
        }
        let Some(score) = cosine_similarity(target, embedding) else {
            skipped += 1;
            continue;
        };

        if score > best_score + TIE_EPSILON {
            best_score = score;
            best.clear();
            best.push(genre.clone());
        } else if (score - best_score).abs() <= TIE_EPSILON {
            best.push(genre.clone());
        }
    }

    if skipped > 0 {
        debug!("Skipped {} catalog embeddings that could not be compared", skipped);
    }
    if best.is_empty() {
        None
    } else {
        Some((best, best_score))
    }
}

/// Resolves genre pairs through catalog embeddings.
pub struct EmbeddingStrategy {
    catalog: Arc<dyn GenreCatalog>,
    fetcher: RetryingFetcher,
    random: Arc<dyn RandomSource>,
}

impl EmbeddingStrategy {
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

    async fn fetch_embedding(&self, genre: &GenreId) -> Result<Embedding, SimilarityError> {
        let representation = self
            .fetcher
            .run("genre_representation", || self.catalog.genre_representation(genre))
            .await?;

        representation
            .and_then(|r| r.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| SimilarityError::MissingRepresentation {
                genre: genre.clone(),
                representation: Representation::Embedding,
            })
    }
}

#[async_trait]
impl SimilarityStrategy for EmbeddingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Embedding
    }

    #[instrument(skip(self), fields(strategy = "embedding"))]
    async fn score(
        &self,
        genre_a: &GenreId,
        genre_b: &GenreId,
    ) -> Result<GenreMatch, SimilarityError> {
        let (embedding_a, embedding_b) = tokio::try_join!(
            self.fetch_embedding(genre_a),
            self.fetch_embedding(genre_b)
        )?;

        if embedding_a.len() != embedding_b.len() {
            return Err(SimilarityError::DimensionMismatch {
                genre: genre_b.clone(),
                expected: embedding_a.len(),
                found: embedding_b.len(),
            });
        }
        let target = average_embedding(&embedding_a, &embedding_b);

        let catalog = self
            .fetcher
            .run("all_embeddings", || self.catalog.all_embeddings())
            .await?;
        debug!("Comparing against {} catalog embeddings", catalog.len());

        let excluded = excluded_seeds(genre_a, genre_b);
        let no_candidates = || SimilarityError::NoEmbeddingCandidates {
            genre_a: genre_a.clone(),
            genre_b: genre_b.clone(),
        };

        let Some((candidates, score)) = best_embedding_candidates(&target, &catalog, &excluded)
        else {
            warn!(
                "No comparable embedding for '{}' + '{}' among {} catalog entries",
                genre_a,
                genre_b,
                catalog.len()
            );
            return Err(no_candidates());
        };

        let result = break_tie(self.random.as_ref(), candidates, score).ok_or_else(no_candidates)?;

        info!(
            "Embedding match for '{}' + '{}': '{}' (cosine {:.4}, {} tied)",
            genre_a, genre_b, result.winner, result.score, result.tied
        );
        Ok(result)
    }
}
