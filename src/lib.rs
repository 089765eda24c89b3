//! Unsplash Grid: keyword photo search with paginated, cancelable image loading.
//!
//! This crate is the core of an image-search client:
//! - Keyword search against the Unsplash photo API, one page at a time
//! - Concurrent thumbnail downloads behind a per-batch admission limit
//! - Cancellation of all in-flight work when the query changes
//! - Generation-checked completions so stale results never reach the grid
//! - A bounded LRU of decoded thumbnails keyed by grid index

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Terminal Shim (main.rs)                            │  ← Presentation stand-in
//! └─────────────────────────────────────────────────────┘
//!                        │ intents          ▲ notifications
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← State machine
//! │  - handle_event (pure transitions)                  │
//! │  - SearchController (executes actions on tokio)     │
//! │  - Notification stream                              │
//! └─────────────────────────────────────────────────────┘
//!              │                            │
//! ┌───────────────────────────┐   ┌───────────────────────┐
//! │ Network Layer (network/)  │   │ Cache Layer (cache/)  │
//! │ - PhotoApi seam           │   │ - LRU by grid index   │
//! │ - reqwest client          │   │ - Image decoding      │
//! │ - TaskRegistry            │   │                       │
//! └───────────────────────────┘   └───────────────────────┘
//!              │                            │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Platform paths (infrastructure/)                 │
//! │  - Error types, Query/Page/Generation (domain/)     │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing subscriber, rotated log file             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Search state machine and controller
//! - [`cache`]: Thumbnail cache and decoding
//! - [`domain`]: Core value types and errors
//! - [`infrastructure`]: Platform paths
//! - [`network`]: Photo API client and task registry
//! - [`observability`]: Tracing setup
//!
//! # Configuration
//!
//! ```toml
//! # ~/.config/unsplash-grid/config.toml
//! access_key = "your-access-key"
//! per_page = 30
//! download_limit = 5
//! batch_notify_size = 10
//! cache_capacity = 100
//! request_timeout_secs = 30
//! trace_level = "info"
//! log_file = "~/.local/state/unsplash-grid/grid.log"
//! ```
//!
//! `UNSPLASH_ACCESS_KEY` in the environment overrides `access_key`.
//!
//! # Key Design Decisions
//!
//! ## Generations Instead of Flags
//!
//! Every query change advances a generation counter. Completions carry the
//! generation they were dispatched under and are dropped on mismatch, so a
//! cancelled download that still finishes cannot resurrect an entry.
//!
//! ## One Lock, One Transition Function
//!
//! All state sits behind one mutex and changes only through
//! [`app::handle_event`]. Notifications are published under that lock, so
//! observers see transitions in order.
//!
//! ## Bounded Fan-Out
//!
//! A page's downloads are driven by one task that waits on a semaphore before
//! starting each download. That wait is the only backpressure.

pub mod app;
pub mod cache;
pub mod domain;
pub mod infrastructure;
pub mod network;
pub mod observability;

pub use app::{
    decode_selected, handle_event, Action, Event, Notification, SearchController, SearchState,
};
pub use domain::{Result, SearchError};
pub use network::{PhotoApi, UnsplashClient};

use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides [`Config::access_key`].
pub const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";

/// Default search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.unsplash.com/search/photos";

/// Application configuration loaded from TOML.
///
/// Every field has a default, so an empty file (or no file) is valid apart
/// from the access key.
///
/// # Example
///
/// ```rust
/// use unsplash_grid::Config;
///
/// let config = Config::from_toml_str("per_page = 12\ntrace_level = \"debug\"").unwrap();
/// assert_eq!(config.per_page, 12);
/// assert_eq!(config.download_limit, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// API access key sent as `Authorization: Client-ID <key>`.
    pub access_key: Option<String>,

    /// Search endpoint URL. Default: `https://api.unsplash.com/search/photos`
    pub search_endpoint: String,

    /// Results requested per page. Default: 30
    pub per_page: u32,

    /// Maximum concurrent image downloads per batch. Default: 5
    pub download_limit: usize,

    /// Notify the grid each time this many more images have arrived. Default: 10
    pub batch_notify_size: usize,

    /// Number of decoded thumbnails kept in memory. Default: 100
    pub cache_capacity: usize,

    /// Timeout applied to every HTTP request, in seconds. Default: 30
    pub request_timeout_secs: u64,

    /// Distance from the end of the grid that loads the next page. Default: 50.0
    pub scroll_threshold: f64,

    /// Log filter used when `RUST_LOG` is unset.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`, or any `EnvFilter`
    /// directive. Default: `"info"`
    pub trace_level: String,

    /// Optional log file; `~` is expanded. Logs go to stderr when unset.
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key: None,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            per_page: 30,
            download_limit: 5,
            batch_notify_size: 10,
            cache_capacity: 100,
            request_timeout_secs: 30,
            scroll_threshold: 50.0,
            trace_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for malformed TOML, unknown keys, or
    /// values that fail [`Config::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SearchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Io`] if the file cannot be read, otherwise the
    /// errors of [`Config::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| match e {
            SearchError::Config(msg) => SearchError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Loads configuration for the application.
    ///
    /// Reads `path` if given, otherwise the default config file if it exists,
    /// otherwise starts from defaults. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// An explicitly given `path` must exist. Parse and validation errors are
    /// returned for any file that is read.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match infrastructure::default_config_path() {
                Some(default) if default.is_file() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Replaces the access key with `UNSPLASH_ACCESS_KEY` when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ACCESS_KEY_ENV) {
            if !key.trim().is_empty() {
                self.access_key = Some(key.trim().to_string());
            }
        }
    }

    /// Checks that every numeric setting is positive.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, bool, &str); 6] = [
            ("per_page", self.per_page > 0, "positive"),
            ("download_limit", self.download_limit > 0, "positive"),
            ("batch_notify_size", self.batch_notify_size > 0, "positive"),
            ("cache_capacity", self.cache_capacity > 0, "positive"),
            ("request_timeout_secs", self.request_timeout_secs > 0, "positive"),
            ("scroll_threshold", self.scroll_threshold >= 0.0, "non-negative"),
        ];

        match checks.iter().find(|(_, ok, _)| !ok) {
            Some((key, _, bound)) => Err(SearchError::Config(format!("{key} must be {bound}"))),
            None => Ok(()),
        }
    }

    /// Returns the access key.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if no non-empty key is configured.
    pub fn require_access_key(&self) -> Result<&str> {
        self.access_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                SearchError::Config(format!(
                    "missing access key: set `access_key` in the config file or {ACCESS_KEY_ENV}"
                ))
            })
    }
}

/// Initializes logging and builds a controller backed by the HTTP client.
///
/// # Side Effects
///
/// - Installs the tracing subscriber (first call only)
///
/// # Errors
///
/// Returns [`SearchError::Config`] when the configuration is invalid or has
/// no access key, and [`SearchError::Runtime`] outside a tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// use unsplash_grid::{initialize, Config};
///
/// # #[tokio::main]
/// # async fn main() -> unsplash_grid::Result<()> {
/// let config = Config::load(None)?;
/// let (controller, notifications) = initialize(&config)?;
/// controller.set_query(Some("forest"));
/// # Ok(())
/// # }
/// ```
pub fn initialize(
    config: &Config,
) -> Result<(SearchController<UnsplashClient>, app::NotificationStream)> {
    observability::init_tracing(config);
    tracing::debug!(endpoint = %config.search_endpoint, "initializing unsplash-grid");

    config.validate()?;
    let client = UnsplashClient::from_config(config)?;
    SearchController::new(client, app::SearchSettings::from(config))
}
