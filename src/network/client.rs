//! HTTP implementation of the photo API.
//!
//! [`PhotoApi`] is the seam the controller is generic over: it is implemented
//! here over `reqwest` and by scripted fakes in tests. Every operation returns
//! a `'static` boxed future so callers can move it into spawned tasks.

use super::registry::TaskRegistry;
use super::response::{extract_regular_urls, search_url};
use crate::domain::{ImageBytes, Page, Query, Result, SearchError};
use crate::Config;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::AUTHORIZATION;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::Instrument;
use url::Url;

/// Remote photo search and image download operations.
///
/// Implementations must track the operations they issue so that
/// [`PhotoApi::cancel_all`] can abort them. An aborted operation resolves to
/// [`SearchError::Cancelled`].
pub trait PhotoApi: Send + Sync + 'static {
    /// Searches for `query` and returns the ordered list of image URLs on `page`.
    fn search_photos(
        &self,
        query: &Query,
        page: Page,
        per_page: u32,
    ) -> BoxFuture<'static, Result<Vec<String>>>;

    /// Downloads the raw bytes at `url`.
    fn load_image(&self, url: &str) -> BoxFuture<'static, Result<ImageBytes>>;

    /// Aborts every operation issued so far. Idempotent.
    fn cancel_all(&self);
}

/// `reqwest`-backed client for the Unsplash search API.
///
/// Cloning is cheap; clones share the connection pool and the task registry.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use unsplash_grid::domain::{Page, Query};
/// use unsplash_grid::network::{PhotoApi, UnsplashClient};
///
/// # #[tokio::main]
/// # async fn main() -> unsplash_grid::Result<()> {
/// let client = UnsplashClient::new(
///     "my-access-key",
///     "https://api.unsplash.com/search/photos",
///     Duration::from_secs(30),
/// )?;
///
/// let query = Query::parse(Some("lighthouse")).unwrap();
/// let urls = client.search_photos(&query, Page::FIRST, 30).await?;
/// println!("{} results", urls.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    http: reqwest::Client,
    access_key: Arc<str>,
    endpoint: Arc<str>,
    registry: Arc<TaskRegistry>,
}

impl UnsplashClient {
    /// Creates a client that applies `timeout` to every request.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidUrl`] if `endpoint` does not parse, or
    /// [`SearchError::Network`] if the TLS backend fails to initialize.
    pub fn new(access_key: &str, endpoint: &str, timeout: Duration) -> Result<Self> {
        Url::parse(endpoint).map_err(|e| SearchError::InvalidUrl(format!("{endpoint}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("unsplash-grid/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            access_key: Arc::from(access_key),
            endpoint: Arc::from(endpoint),
            registry: Arc::new(TaskRegistry::new()),
        })
    }

    /// Creates a client from the access key, endpoint, and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if no access key is configured, plus the
    /// errors of [`UnsplashClient::new`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let key = config.require_access_key()?;
        Self::new(
            key,
            &config.search_endpoint,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Number of requests currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.registry.in_flight()
    }

    /// Runs `request` as a registered task and maps abort to `Cancelled`.
    fn tracked<T, F>(&self, request: F) -> BoxFuture<'static, Result<T>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        async move {
            let handle = Handle::try_current()
                .map_err(|e| SearchError::Runtime(format!("no tokio runtime: {e}")))?;

            match registry.spawn(&handle, request).await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(SearchError::Cancelled),
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            }
        }
        .boxed()
    }
}

impl PhotoApi for UnsplashClient {
    fn search_photos(
        &self,
        query: &Query,
        page: Page,
        per_page: u32,
    ) -> BoxFuture<'static, Result<Vec<String>>> {
        let url = match search_url(&self.endpoint, query, page, per_page) {
            Ok(url) => url,
            Err(e) => return futures_util::future::ready(Err(e)).boxed(),
        };
        let request = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Client-ID {}", self.access_key));
        let span = tracing::debug_span!("search_photos", %query, page = page.get());

        self.tracked(
            async move {
                let response = request.send().await?.error_for_status()?;
                let body = response.bytes().await?;
                let urls = extract_regular_urls(&body)?;

                tracing::debug!(url_count = urls.len(), "search completed");
                Ok(urls)
            }
            .instrument(span),
        )
    }

    fn load_image(&self, url: &str) -> BoxFuture<'static, Result<ImageBytes>> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return futures_util::future::ready(Err(SearchError::InvalidUrl(format!(
                    "{url}: {e}"
                ))))
                .boxed()
            }
        };
        let request = self.http.get(parsed);

        self.tracked(async move {
            let response = request.send().await?.error_for_status()?;
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(SearchError::NoData);
            }

            Ok(ImageBytes::from(bytes.as_ref()))
        })
    }

    fn cancel_all(&self) {
        self.registry.cancel_all();
    }
}
