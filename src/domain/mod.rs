//! Domain layer for the search pipeline.
//!
//! This module contains the core value types and error taxonomy, independent
//! of the HTTP client, the async runtime, and the presentation layer.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`query`]: Query, page, and generation value types
//! - [`image`]: Downloaded image record
//!
//! # Examples
//!
//! ```
//! use unsplash_grid::domain::{Page, Query};
//!
//! let query = Query::parse(Some("mountains")).unwrap();
//! assert_eq!(query.as_str(), "mountains");
//! assert_eq!(Page::default().get(), 1);
//! ```

pub mod error;
pub mod image;
pub mod query;

pub use error::{Result, SearchError};
pub use image::{ImageBytes, LoadedImage};
pub use query::{Generation, Page, Query};
