//! SQLite-backed genre catalog.
//!
//! Expects an existing database with this layout (schema management lives
//! outside this crate):
//!
//! ```sql
//! CREATE TABLE genres (
//!     id        INTEGER PRIMARY KEY,
//!     name      TEXT NOT NULL UNIQUE,   -- canonical lowercase name
//!     similar   TEXT,                   -- JSON array of genre names, most similar first
//!     embedding TEXT                    -- JSON array of floats
//! );
//! CREATE TABLE artists (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
//! CREATE TABLE genre_artists (
//!     genre_id  INTEGER NOT NULL REFERENCES genres(id),
//!     artist_id INTEGER NOT NULL REFERENCES artists(id),
//!     PRIMARY KEY (genre_id, artist_id)
//! );
//! ```
//!
//! NULL or empty `similar`/`embedding` columns mean "not available".

use crate::error::{CatalogError, Result};
use crate::traits::GenreCatalog;
use crate::types::{clean_rank_list, ArtistName, Embedding, GenreId, GenreRepresentation};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, warn};

/// Catalog queried from a SQLite database through a connection pool.
///
/// The pool is opened by [`SqliteCatalog::connect`] and released by
/// [`GenreCatalog::close`]; the owning application decides when.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open a pool against `url` (e.g. `sqlite://everynoise.db`)
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to SQLite genre catalog at {}", url);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_representation(&self, genre: &GenreId) -> Result<Option<GenreRepresentation>> {
        let row = sqlx::query_as::<_, (Option<String>, Option<String>)>(
            "SELECT similar, embedding FROM genres WHERE name = ?1",
        )
        .bind(genre.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some((similar, embedding)) = row else {
            debug!("Genre '{}' not found in SQLite catalog", genre);
            return Ok(None);
        };

        let rank_list = decode_json_column::<Vec<String>>(genre, "similar", similar)?
            .map(|names| clean_rank_list(genre, names.into_iter().map(GenreId::from)));
        let embedding = decode_json_column::<Embedding>(genre, "embedding", embedding)?
            .filter(|values| !values.is_empty());

        Ok(Some(GenreRepresentation { rank_list, embedding }))
    }

    async fn fetch_embeddings(&self) -> Result<Vec<(GenreId, Embedding)>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT name, embedding FROM genres \
             WHERE embedding IS NOT NULL AND embedding != '' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut embeddings = Vec::with_capacity(rows.len());
        for (name, raw) in rows {
            let genre = GenreId::new(name);
            match serde_json::from_str::<Embedding>(&raw) {
                Ok(values) if !values.is_empty() => embeddings.push((genre, values)),
                Ok(_) => {}
                Err(err) => warn!("Skipping unreadable embedding for genre '{}': {}", genre, err),
            }
        }
        Ok(embeddings)
    }

    async fn fetch_artists(&self, genre: &GenreId) -> Result<Vec<ArtistName>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT a.name FROM artists a \
             JOIN genre_artists ga ON ga.artist_id = a.id \
             JOIN genres g ON g.id = ga.genre_id \
             WHERE g.name = ?1 ORDER BY a.id",
        )
        .bind(genre.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_artist_genres(&self, artist: &str) -> Result<Vec<GenreId>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT g.name FROM genres g \
             JOIN genre_artists ga ON ga.genre_id = g.id \
             JOIN artists a ON a.id = ga.artist_id \
             WHERE lower(a.name) = lower(?1) ORDER BY g.id",
        )
        .bind(artist.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GenreId::from).collect())
    }

    async fn genre_exists(&self, genre: &GenreId) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM genres WHERE name = ?1")
            .bind(genre.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

/// Decode an optional JSON text column; NULL and '' both mean "absent"
fn decode_json_column<T: DeserializeOwned>(
    genre: &GenreId,
    column: &str,
    raw: Option<String>,
) -> Result<Option<T>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => serde_json::from_str(text).map(Some).map_err(|err| {
            CatalogError::ValidationError(format!(
                "column '{}' of genre '{}' is not valid JSON: {}",
                column, genre, err
            ))
        }),
    }
}

#[async_trait]
impl GenreCatalog for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn genre_representation(
        &self,
        genre: &GenreId,
    ) -> anyhow::Result<Option<GenreRepresentation>> {
        Ok(self.fetch_representation(genre).await?)
    }

    async fn all_embeddings(&self) -> anyhow::Result<Vec<(GenreId, Embedding)>> {
        Ok(self.fetch_embeddings().await?)
    }

    async fn artists_for_genre(&self, genre: &GenreId) -> anyhow::Result<Vec<ArtistName>> {
        Ok(self.fetch_artists(genre).await?)
    }

    async fn genres_for_artist(&self, artist: &str) -> anyhow::Result<Vec<GenreId>> {
        Ok(self.fetch_artist_genres(artist).await?)
    }

    async fn known_genres(&self, genres: &[GenreId]) -> anyhow::Result<Vec<GenreId>> {
        let mut known = Vec::with_capacity(genres.len());
        for genre in genres {
            if self.genre_exists(genre).await? {
                known.push(genre.clone());
            }
        }
        Ok(known)
    }

    async fn close(&self) {
        info!("Closing SQLite genre catalog");
        self.pool.close().await;
    }
}
