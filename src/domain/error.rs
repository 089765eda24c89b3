//! Error types for the search pipeline.
//!
//! This module defines the centralized error type [`SearchError`] and a type alias
//! [`Result`] used throughout the crate. Errors are implemented with the
//! `thiserror` crate for automatic `Error` trait implementation.
//!
//! Apart from [`SearchError::Config`] and [`SearchError::Runtime`], every
//! variant is non-fatal: a failed search is reported and treated as a no-op,
//! and a failed image download only means the slot never arrives.

use thiserror::Error;

/// The main error type for search, download, and decode operations.
///
/// The first five variants mirror the failure modes of the remote photo API.
/// The remaining variants cover cancellation, decoding, configuration, and I/O.
///
/// # Examples
///
/// ```
/// use unsplash_grid::SearchError;
///
/// fn require_key(key: Option<&str>) -> Result<&str, SearchError> {
///     key.ok_or_else(|| SearchError::Config("access key is missing".to_string()))
/// }
///
/// assert!(require_key(None).is_err());
/// ```
#[derive(Debug, Error)]
pub enum SearchError {
    /// A request URL could not be built or parsed.
    ///
    /// The string contains the offending URL or a description of the problem.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The response carried no body.
    #[error("Response contained no data")]
    NoData,

    /// The response was valid JSON but not the expected shape.
    ///
    /// Raised when the top-level `results` array is missing.
    #[error("Unexpected response format")]
    InvalidResponse,

    /// The response body was not valid JSON.
    #[error("Parsing error: {0}")]
    Parsing(#[from] serde_json::Error),

    /// Transport-level failure or a non-success HTTP status.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The operation was aborted through the task registry.
    #[error("Operation cancelled")]
    Cancelled,

    /// Image bytes could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Configuration is invalid or missing.
    ///
    /// A missing access key is the only condition the binary treats as fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No async runtime was available to run background work.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Returns `true` when the error is the result of a deliberate cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A specialized `Result` type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
