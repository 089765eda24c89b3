//! Network layer: the photo API seam, its HTTP client, and task tracking.
//!
//! # Modules
//!
//! - [`client`]: [`PhotoApi`] trait and the `reqwest`-backed [`UnsplashClient`]
//! - [`registry`]: [`TaskRegistry`] of cancelable in-flight tasks
//! - [`response`]: Search URL construction and result extraction
//!
//! # Wire Format
//!
//! ```text
//! GET <endpoint>?query=<q>&page=<p>&per_page=<n>
//! Authorization: Client-ID <access key>
//!
//! { "results": [ { "urls": { "regular": "<url>" } }, ... ] }
//! ```
//!
//! Image downloads are a plain `GET <url>` whose body is the raw image.

pub mod client;
pub mod registry;
pub mod response;

pub use client::{PhotoApi, UnsplashClient};
pub use registry::{TaskId, TaskRegistry};
