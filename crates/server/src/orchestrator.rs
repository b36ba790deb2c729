//! # Recommendation Orchestrator
//!
//! This module drives one recommendation end to end:
//! 1. Fetch both seed tracks (in parallel)
//! 2. Resolve each seed to its candidate genre set
//! 3. Sample one genre per seed
//! 4. Resolve the pair to a winning genre
//! 5. Look up the winning genre's artists and sample one
//! 6. Resolve the artist to a representative track
//! 7. Assemble the `MatchResult`
//!
//! Every collaborator call goes through the `RetryingFetcher`; nothing is
//! retried at this level.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use catalog::{ArtistName, GenreCatalog, GenreId};
use fetcher::{RetryError, RetryingFetcher};
use similarity::random::choose;
use similarity::{RandomSource, SimilarityResolver, StrategyKind};
use upstream::{MusicApi, SeedTrack, Track};

use crate::config::EngineConfig;
use crate::error::RecommendError;
use crate::seeds::SeedResolver;

/// Final recommendation for a pair of seeds. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    seed_genres: [GenreId; 2],
    matched_genre: GenreId,
    score: f64,
    strategy: StrategyKind,
    artist: ArtistName,
    track: Track,
    seed_cover_art: [Option<String>; 2],
}

impl MatchResult {
    /// The genres sampled from the first and second seed
    pub fn seed_genres(&self) -> (&GenreId, &GenreId) {
        (&self.seed_genres[0], &self.seed_genres[1])
    }

    pub fn matched_genre(&self) -> &GenreId {
        &self.matched_genre
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn seed_cover_art(&self) -> (Option<&str>, Option<&str>) {
        (
            self.seed_cover_art[0].as_deref(),
            self.seed_cover_art[1].as_deref(),
        )
    }

    pub fn into_track(self) -> Track {
        self.track
    }
}

/// Coordinates catalog, resolver and music API for each request.
///
/// Holds no per-request state; clone it freely and call `recommend`
/// concurrently.
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<dyn GenreCatalog>,
    api: Arc<dyn MusicApi>,
    resolver: SimilarityResolver,
    seeds: SeedResolver,
    fetcher: RetryingFetcher,
    random: Arc<dyn RandomSource>,
    request_timeout: Option<Duration>,
}

impl RecommendationOrchestrator {
    /// Wire the collaborators together as `config` describes
    pub fn new(
        catalog: Arc<dyn GenreCatalog>,
        api: Arc<dyn MusicApi>,
        random: Arc<dyn RandomSource>,
        config: &EngineConfig,
    ) -> Self {
        let fetcher = RetryingFetcher::new(config.retry.policy());
        let resolver = SimilarityResolver::new(
            config.strategy,
            catalog.clone(),
            fetcher.clone(),
            random.clone(),
        );
        let seeds = SeedResolver::new(catalog.clone(), fetcher.clone(), config.seed_genres);

        Self {
            catalog,
            api,
            resolver,
            seeds,
            fetcher,
            random,
            request_timeout: config.request_timeout(),
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.resolver.kind()
    }

    pub fn resolver(&self) -> &SimilarityResolver {
        &self.resolver
    }

    /// Main entry point: recommend a track bridging two seed tracks
    #[instrument(skip(self), fields(strategy = %self.resolver.kind()))]
    pub async fn recommend(&self, seed1: &str, seed2: &str) -> Result<MatchResult, RecommendError> {
        let Some(budget) = self.request_timeout else {
            return self.run(seed1, seed2).await;
        };

        match tokio::time::timeout(budget, self.run(seed1, seed2)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Recommendation for '{}' + '{}' exceeded {:?}", seed1, seed2, budget);
                Err(RecommendError::DeadlineExceeded(budget))
            }
        }
    }

    async fn run(&self, seed1: &str, seed2: &str) -> Result<MatchResult, RecommendError> {
        let start_time = Instant::now();

        // Seed tracks first, so an empty seed fails before any catalog call
        let (track1, track2) = tokio::try_join!(self.fetch_seed(seed1), self.fetch_seed(seed2))?;
        for (seed, track) in [(seed1, &track1), (seed2, &track2)] {
            if !self.seeds.has_candidates(track) {
                return Err(RecommendError::NoGenreAssociation {
                    seed: seed.to_string(),
                });
            }
        }

        let (genres1, genres2) = tokio::try_join!(
            self.seeds.seed_genres(&track1),
            self.seeds.seed_genres(&track2)
        )?;
        info!(
            "Seed genres: '{}' -> {:?}, '{}' -> {:?}",
            seed1, genres1, seed2, genres2
        );

        let genre1 = self.sample_genre(seed1, &genres1)?;
        let genre2 = self.sample_genre(seed2, &genres2)?;
        info!("Sampled seed genres '{}' and '{}'", genre1, genre2);

        let matched = self
            .resolver
            .resolve(&genre1, &genre2)
            .await
            .map_err(|err| RecommendError::from_similarity(&genre1, &genre2, err))?;

        let artists = self
            .fetcher
            .run("artists_for_genre", || self.catalog.artists_for_genre(&matched.winner))
            .await?;
        debug!("Genre '{}' has {} artists", matched.winner, artists.len());

        let artist = choose(self.random.as_ref(), &artists)
            .cloned()
            .ok_or_else(|| RecommendError::NoArtistForGenre {
                genre: matched.winner.clone(),
            })?;

        let track = self
            .fetcher
            .run("find_artist_track", || self.api.find_artist_track(&artist))
            .await?
            .ok_or_else(|| RecommendError::NoTrackForArtist {
                artist: artist.clone(),
            })?;

        info!(
            "Matched '{}' by {} via genre '{}' (score {:.4}) in {:.2?}",
            track.name,
            track.artist_line(),
            matched.winner,
            matched.score,
            start_time.elapsed()
        );

        Ok(MatchResult {
            seed_genres: [genre1, genre2],
            matched_genre: matched.winner,
            score: matched.score,
            strategy: self.resolver.kind(),
            artist,
            track,
            seed_cover_art: [track1.cover_art, track2.cover_art],
        })
    }

    async fn fetch_seed(&self, seed: &str) -> Result<SeedTrack, RetryError> {
        self.fetcher
            .run("fetch_seed_track", || self.api.fetch_seed_track(seed))
            .await
    }

    /// Uniform pick from a seed's genre set
    fn sample_genre(&self, seed: &str, genres: &[GenreId]) -> Result<GenreId, RecommendError> {
        choose(self.random.as_ref(), genres)
            .cloned()
            .ok_or_else(|| RecommendError::NoGenreAssociation {
                seed: seed.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{CatalogIndex, Genre};
    use similarity::SequenceRandom;
    use upstream::{Album, ArtistRef};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    /// Music API answering from fixed data
    struct StaticApi;

    #[async_trait::async_trait]
    impl MusicApi for StaticApi {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch_seed_track(&self, track_id: &str) -> anyhow::Result<SeedTrack> {
            let genres = match track_id {
                "left" => vec!["Rock".to_string()],
                "right" => vec!["Jazz".to_string()],
                _ => Vec::new(),
            };
            Ok(SeedTrack {
                id: track_id.to_string(),
                name: format!("Track {}", track_id),
                artists: vec![ArtistRef {
                    id: "a".to_string(),
                    name: "Someone".to_string(),
                }],
                genres,
                cover_art: Some(format!("https://img.example/{}.jpg", track_id)),
            })
        }

        async fn find_artist_track(&self, artist: &str) -> anyhow::Result<Option<Track>> {
            Ok(Some(Track {
                id: "t".to_string(),
                name: format!("Best of {}", artist),
                artists: vec![artist.to_string()],
                album: Album::default(),
                preview_url: None,
                url: None,
                explicit: false,
            }))
        }

        async fn search_tracks(&self, _query: &str, _limit: usize) -> anyhow::Result<Vec<SeedTrack>> {
            Ok(Vec::new())
        }
    }

    fn build_test_orchestrator(picks: &[usize]) -> RecommendationOrchestrator {
        let index = CatalogIndex::from_genres(vec![
            Genre::new("rock").with_rank_list(["fusion", "punk"]),
            Genre::new("jazz").with_rank_list(["bebop", "fusion"]),
            Genre::new("fusion").with_artists(["Weather Report", "Return to Forever"]),
        ])
        .unwrap();

        RecommendationOrchestrator::new(
            Arc::new(index),
            Arc::new(StaticApi),
            Arc::new(SequenceRandom::new(picks.iter().copied())),
            &EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_recommend_assembles_result() {
        let orchestrator = build_test_orchestrator(&[1]);
        let result = orchestrator.recommend("left", "right").await.unwrap();

        assert_eq!(result.seed_genres(), (&GenreId::new("rock"), &GenreId::new("jazz")));
        assert_eq!(result.matched_genre(), &GenreId::new("fusion"));
        assert_eq!(result.artist(), "Return to Forever");
        assert_eq!(result.track().name, "Best of Return to Forever");
        assert_eq!(result.strategy(), StrategyKind::Rank);
        assert_eq!(
            result.seed_cover_art(),
            (Some("https://img.example/left.jpg"), Some("https://img.example/right.jpg"))
        );
        // fusion: index 1 of 3 in rock's list, index 2 of 3 in jazz's list
        assert!((result.score() - 0.25).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_sample_genre_from_empty_set() {
        let orchestrator = build_test_orchestrator(&[]);
        let err = orchestrator.sample_genre("seed", &[]).unwrap_err();
        assert!(matches!(err, RecommendError::NoGenreAssociation { seed } if seed == "seed"));
    }

    #[tokio::test]
    async fn test_seed_without_tags() {
        let orchestrator = build_test_orchestrator(&[]);
        let err = orchestrator.recommend("left", "untagged").await.unwrap_err();
        assert!(matches!(err, RecommendError::NoGenreAssociation { seed } if seed == "untagged"));
    }

    #[tokio::test]
    async fn test_match_result_serializes() {
        let orchestrator = build_test_orchestrator(&[0]);
        let result = orchestrator.recommend("left", "right").await.unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["matched_genre"], "fusion");
        assert_eq!(json["strategy"], "rank");
        assert_eq!(json["artist"], "Weather Report");
        assert_eq!(json["seed_genres"][1], "jazz");
    }
}
