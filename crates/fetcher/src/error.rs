//! Error types for retried calls.

use std::fmt;
use thiserror::Error;

/// A retried call gave up.
///
/// Carries the last underlying error so callers can still inspect what
/// the collaborator actually reported.
#[derive(Error, Debug)]
#[error("{operation} failed after {attempts} attempt(s)")]
pub struct RetryError {
    pub operation: String,
    pub attempts: u32,
    #[source]
    pub last_error: anyhow::Error,
}

/// Marker attached to errors that retrying cannot fix (bad request,
/// unknown id, revoked credentials).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermanentError;

impl fmt::Display for PermanentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("permanent failure")
    }
}

/// Mark an error as not worth retrying
pub fn permanent(err: impl Into<anyhow::Error>) -> anyhow::Error {
    err.into().context(PermanentError)
}

/// Was this error marked with [`permanent`]?
pub fn is_permanent(err: &anyhow::Error) -> bool {
    err.downcast_ref::<PermanentError>().is_some()
}
