//! Genre-pair similarity resolution.
//!
//! This crate provides:
//! - SimilarityStrategy trait with rank-list and embedding implementations
//! - SimilarityResolver, which picks the strategy named in configuration
//! - An injectable RandomSource for breaking ties between equal scores
//!
//! ## Architecture
//! Both strategies answer the same question: given two genres, which genre
//! is most similar to both of them?
//! 1. **Rank**: intersect the anchored rank lists, score each shared genre
//!    by its normalized positions
//! 2. **Embedding**: average the two embeddings, find the nearest catalog
//!    embedding by cosine similarity
//!
//! When the two genres differ neither may win, so a pair always resolves to
//! a third genre. Catalog reads go through a `RetryingFetcher`.
//!
//! ## Example Usage
//! ```ignore
//! use similarity::{SeededRandom, SimilarityResolver, StrategyKind};
//!
//! let resolver = SimilarityResolver::new(
//!     StrategyKind::Embedding,
//!     catalog.clone(),
//!     RetryingFetcher::default(),
//!     Arc::new(SeededRandom::new(None)),
//! );
//! let result = resolver.resolve(&GenreId::new("rock"), &GenreId::new("jazz")).await?;
//! println!("{} ({:.3})", result.winner, result.score);
//! ```

pub mod traits;
pub mod error;
pub mod random;
pub mod rank;
pub mod embedding;
pub mod resolver;

// Re-export main types
pub use embedding::{average_embedding, cosine_similarity, EmbeddingStrategy};
pub use error::{Representation, SimilarityError};
pub use random::{RandomSource, SeededRandom, SequenceRandom};
pub use rank::{anchored_rank_list, normalized_rank, rank_score, RankStrategy};
pub use resolver::SimilarityResolver;
pub use traits::{GenreMatch, SimilarityStrategy, StrategyKind};
