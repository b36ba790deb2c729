//! Error types for the catalog crate.

use thiserror::Error;

/// Errors that can occur while loading or querying the genre catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be found or opened
    #[error("Failed to open catalog file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the catalog
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Catalog document is not valid JSON (or has the wrong shape)
    #[error("Malformed catalog document: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A single genre entry could not be used
    #[error("Invalid genre entry #{entry}: {reason}")]
    ParseError { entry: usize, reason: String },

    /// An embedding contained values we cannot compute with
    #[error("Invalid embedding for genre '{genre}': {reason}")]
    InvalidEmbedding { genre: String, reason: String },

    /// Embeddings in one catalog must all have the same dimension
    #[error("Embedding for genre '{genre}' has {found} dimensions, expected {expected}")]
    InconsistentDimensions {
        genre: String,
        expected: usize,
        found: usize,
    },

    /// Query against the SQLite store failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Catalog validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
