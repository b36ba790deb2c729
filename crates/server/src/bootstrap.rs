//! Startup and shutdown of the engine's collaborators.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use catalog::{CatalogIndex, GenreCatalog, SqliteCatalog};
use similarity::{RandomSource, SeededRandom};
use upstream::{MusicApi, SpotifyClient};

use crate::config::{CatalogConfig, EngineConfig};
use crate::orchestrator::RecommendationOrchestrator;

/// Open the catalog backend named in the configuration
pub async fn open_catalog(config: &CatalogConfig) -> Result<Arc<dyn GenreCatalog>> {
    let catalog: Arc<dyn GenreCatalog> = match config {
        CatalogConfig::Json { path } => {
            let index = CatalogIndex::load_from_file(path)
                .with_context(|| format!("Loading JSON catalog from {}", path.display()))?;
            Arc::new(index)
        }
        CatalogConfig::Sqlite {
            url,
            max_connections,
        } => {
            let store = SqliteCatalog::connect(url, *max_connections)
                .await
                .with_context(|| format!("Connecting to SQLite catalog at {}", url))?;
            Arc::new(store)
        }
    };
    info!("Genre catalog ready ({})", catalog.name());
    Ok(catalog)
}

/// A running engine: the collaborators plus the orchestrator built on them.
///
/// The catalog connection lives from `start` until `shutdown`.
pub struct Engine {
    config: EngineConfig,
    catalog: Arc<dyn GenreCatalog>,
    orchestrator: RecommendationOrchestrator,
}

impl Engine {
    /// Validate the configuration, open the catalog and the music API client
    pub async fn start(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Starting song-match engine (strategy: {}, seeds: {})",
            config.strategy, config.seed_genres
        );

        let catalog = open_catalog(&config.catalog).await?;
        let client = SpotifyClient::new(config.upstream.spotify_config()?)
            .context("Creating music API client")?;

        Ok(Self::with_collaborators(config, catalog, Arc::new(client)))
    }

    /// Build an engine around already opened collaborators
    pub fn with_collaborators(
        config: EngineConfig,
        catalog: Arc<dyn GenreCatalog>,
        api: Arc<dyn MusicApi>,
    ) -> Self {
        let random: Arc<dyn RandomSource> = Arc::new(SeededRandom::new(config.random_seed));
        let orchestrator = RecommendationOrchestrator::new(catalog.clone(), api, random, &config);
        Self {
            config,
            catalog,
            orchestrator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn GenreCatalog> {
        &self.catalog
    }

    pub fn orchestrator(&self) -> &RecommendationOrchestrator {
        &self.orchestrator
    }

    /// Release the catalog. Outstanding orchestrator clones must not be used
    /// afterwards.
    pub async fn shutdown(self) {
        info!("Shutting down song-match engine");
        self.catalog.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_open_missing_json_catalog() {
        let config = CatalogConfig::Json {
            path: PathBuf::from("does/not/exist.json"),
        };
        let err = open_catalog(&config).await.err().unwrap();
        assert!(format!("{:#}", err).contains("does/not/exist.json"));
    }

    #[tokio::test]
    async fn test_open_sqlite_catalog() {
        let config = CatalogConfig::Sqlite {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        };
        let catalog = open_catalog(&config).await.unwrap();
        assert_eq!(catalog.name(), "sqlite");
        catalog.close().await;
    }
}
