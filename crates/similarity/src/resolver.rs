//! The SimilarityResolver selects and runs the configured strategy.

use crate::embedding::EmbeddingStrategy;
use crate::error::SimilarityError;
use crate::random::RandomSource;
use crate::rank::RankStrategy;
use crate::traits::{GenreMatch, SimilarityStrategy, StrategyKind};
use catalog::{GenreCatalog, GenreId};
use fetcher::RetryingFetcher;
use std::sync::Arc;
use tracing::debug;

/// Entry point for genre-pair resolution.
///
/// ## Usage
/// ```ignore
/// let resolver = SimilarityResolver::new(StrategyKind::Rank, catalog, fetcher, random);
/// let result = resolver.resolve(&GenreId::new("rock"), &GenreId::new("jazz")).await?;
/// ```
#[derive(Clone)]
pub struct SimilarityResolver {
    strategy: Arc<dyn SimilarityStrategy>,
}

impl SimilarityResolver {
    /// Build the strategy named by `kind` over a shared catalog
    pub fn new(
        kind: StrategyKind,
        catalog: Arc<dyn GenreCatalog>,
        fetcher: RetryingFetcher,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let strategy: Arc<dyn SimilarityStrategy> = match kind {
            StrategyKind::Rank => Arc::new(RankStrategy::new(catalog, fetcher, random)),
            StrategyKind::Embedding => Arc::new(EmbeddingStrategy::new(catalog, fetcher, random)),
        };
        Self { strategy }
    }

    /// Wrap an already constructed strategy
    pub fn from_strategy(strategy: impl SimilarityStrategy + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Resolve two genres to the genre most similar to both
    pub async fn resolve(
        &self,
        genre_a: &GenreId,
        genre_b: &GenreId,
    ) -> Result<GenreMatch, SimilarityError> {
        debug!(
            "Resolving '{}' + '{}' with {} strategy",
            genre_a,
            genre_b,
            self.kind()
        );
        self.strategy.score(genre_a, genre_b).await
    }
}

impl std::fmt::Debug for SimilarityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityResolver")
            .field("strategy", &self.kind())
            .finish()
    }
}
