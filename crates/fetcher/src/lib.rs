//! Retry policy for calls that leave the process.
//!
//! Every catalog query and upstream API call is wrapped in a
//! [`RetryingFetcher`]: each attempt is bounded by a timeout, failures back
//! off exponentially (`initial_delay * multiplier^n`), and once the budget is
//! spent the last error is returned as a [`RetryError`]. Errors marked with
//! [`permanent`] skip the remaining attempts.
//!
//! ## Example Usage
//! ```ignore
//! use fetcher::{RetryPolicy, RetryingFetcher};
//!
//! let fetcher = RetryingFetcher::new(RetryPolicy::default());
//! let artists = fetcher
//!     .run("artists_for_genre", || catalog.artists_for_genre(&genre))
//!     .await?;
//! ```

pub mod error;
pub mod fetcher;
pub mod policy;

pub use error::{is_permanent, permanent, PermanentError, RetryError};
pub use fetcher::RetryingFetcher;
pub use policy::RetryPolicy;
