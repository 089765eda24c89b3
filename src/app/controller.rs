//! Runtime that executes the state machine's actions.
//!
//! [`SearchController`] owns the [`SearchState`] behind a single mutex, the
//! thumbnail cache, and a [`TaskRegistry`] of its own spawned tasks. Every
//! user intent and every asynchronous completion goes through the same
//! `dispatch` path:
//!
//! ```text
//! lock state ─► handle_event ─► execute actions (spawn / abort / notify) ─► unlock
//! ```
//!
//! # Download Fan-Out
//!
//! Each `DownloadBatch` action spawns one driver task. The driver holds a
//! semaphore with `download_limit` permits and waits for a permit before
//! spawning each download into a `JoinSet`, so at most `download_limit`
//! downloads of a batch are in flight. Aborting the driver drops the
//! `JoinSet`, which aborts its downloads.
//!
//! # Lock Order
//!
//! State before cache. [`SearchController::thumbnail`] never decodes while
//! holding either lock.

use super::actions::Action;
use super::handler::{handle_event, Event};
use super::notification::{self, NotificationStream, Notifier};
use super::state::{ScrollMetrics, SearchSettings, SearchSnapshot, SearchState};
use crate::cache::{self, ImageCache};
use crate::domain::{Generation, LoadedImage, Page, Query, Result, SearchError};
use crate::network::{PhotoApi, TaskRegistry};
use image::DynamicImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Search, pagination, and image-loading controller.
///
/// Dropping the controller cancels every outstanding search and download.
///
/// # Example
///
/// ```rust,no_run
/// use unsplash_grid::app::{Notification, SearchController, SearchSettings};
/// use unsplash_grid::network::UnsplashClient;
/// use unsplash_grid::Config;
///
/// # #[tokio::main]
/// # async fn main() -> unsplash_grid::Result<()> {
/// let config = Config::load(None)?;
/// let client = UnsplashClient::from_config(&config)?;
/// let (controller, mut notifications) =
///     SearchController::new(client, SearchSettings::from(&config))?;
///
/// controller.set_query(Some("harbor"));
/// while let Some(notification) = notifications.recv().await {
///     if let Notification::LoadingChanged(false) = notification {
///         break;
///     }
/// }
/// println!("{} images", controller.number_of_images());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SearchController<A: PhotoApi> {
    inner: Arc<Inner<A>>,
}

#[derive(Debug)]
struct Inner<A: PhotoApi> {
    api: Arc<A>,
    state: Mutex<SearchState>,
    cache: Mutex<ImageCache>,
    tasks: TaskRegistry,
    notifier: Notifier,
    runtime: Handle,
    settings: SearchSettings,
}

impl<A: PhotoApi> SearchController<A> {
    /// Creates a controller on the current tokio runtime.
    ///
    /// Returns the controller and the single subscription to its notifications.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Runtime`] when called outside a tokio runtime.
    pub fn new(api: A, settings: SearchSettings) -> Result<(Self, NotificationStream)> {
        let runtime = Handle::try_current()
            .map_err(|e| SearchError::Runtime(format!("no tokio runtime: {e}")))?;
        Ok(Self::with_runtime(api, settings, runtime))
    }

    /// Creates a controller that spawns its tasks on `runtime`.
    #[must_use]
    pub fn with_runtime(
        api: A,
        settings: SearchSettings,
        runtime: Handle,
    ) -> (Self, NotificationStream) {
        let (notifier, stream) = notification::channel();
        let inner = Inner {
            api: Arc::new(api),
            cache: Mutex::new(ImageCache::new(settings.cache_capacity)),
            state: Mutex::new(SearchState::new(settings)),
            tasks: TaskRegistry::new(),
            notifier,
            runtime,
            settings,
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            stream,
        )
    }

    /// Sets the search text. `None` or blank text performs a hard reset.
    pub fn set_query(&self, text: Option<&str>) {
        self.inner.dispatch(Event::SetQuery(text.map(String::from)));
    }

    /// Requests the next page of the current query.
    ///
    /// Ignored when there is no query or a page is already loading.
    pub fn load_next_page(&self) {
        self.inner.dispatch(Event::LoadNextPage);
    }

    /// Reports the grid's scroll position; loads the next page near the end.
    pub fn visible_range_changed(&self, metrics: ScrollMetrics) {
        self.inner.dispatch(Event::Scrolled(metrics));
    }

    /// Emits [`Notification::ImageSelected`](super::Notification::ImageSelected) for the image at `index`, if present.
    pub fn image_tapped(&self, index: usize) {
        self.inner.dispatch(Event::ImageTapped(index));
    }

    /// Returns the image at `index`, or `None` if it has not arrived.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<LoadedImage> {
        self.inner.lock_state().image(index).cloned()
    }

    /// Number of images downloaded for the current query.
    #[must_use]
    pub fn number_of_images(&self) -> usize {
        self.inner.lock_state().number_of_images()
    }

    /// Whether a search or download is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.lock_state().loading
    }

    /// Whether the latest search returned nothing.
    #[must_use]
    pub fn no_results_found(&self) -> bool {
        self.inner.lock_state().no_results
    }

    /// Last page whose results were appended.
    #[must_use]
    pub fn current_page(&self) -> Page {
        self.inner.lock_state().page
    }

    /// Captures the current state for display.
    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.lock_state().snapshot()
    }

    /// Returns the decoded thumbnail at `index`, decoding and caching on a miss.
    ///
    /// Returns `Ok(None)` if the image has not arrived.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Decode`] if the downloaded bytes are not a
    /// supported image.
    pub fn thumbnail(&self, index: usize) -> Result<Option<Arc<DynamicImage>>> {
        if let Some(hit) = self.inner.lock_cache().get(index) {
            return Ok(Some(hit));
        }

        let (generation, image) = {
            let state = self.inner.lock_state();
            match state.image(index) {
                Some(image) => (state.generation, image.clone()),
                None => return Ok(None),
            }
        };

        let decoded = Arc::new(cache::decode(&image.bytes)?);

        // A reset in the meantime re-keys the grid; don't cache under the old index.
        let state = self.inner.lock_state();
        if state.generation == generation {
            self.inner.lock_cache().set(index, Arc::clone(&decoded));
        }
        drop(state);

        Ok(Some(decoded))
    }

    /// Number of controller tasks (searches and download drivers) in flight.
    #[must_use]
    pub fn tasks_in_flight(&self) -> usize {
        self.inner.tasks.in_flight()
    }
}

impl<A: PhotoApi> Drop for SearchController<A> {
    fn drop(&mut self) {
        self.inner.tasks.cancel_all();
        self.inner.api.cancel_all();
    }
}

/// Decodes a selected image for a full-size detail view.
///
/// # Errors
///
/// Returns [`SearchError::Decode`] for unsupported or corrupt data.
pub fn decode_selected(image: &LoadedImage) -> Result<DynamicImage> {
    cache::decode(&image.bytes)
}

impl<A: PhotoApi> Inner<A> {
    // A panicking holder cannot leave the state half-written in a way later
    // transitions rely on; keep serving.
    fn lock_state(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, ImageCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(self: &Arc<Self>, event: Event) {
        let mut state = self.lock_state();
        let actions = handle_event(&mut state, event);
        for action in actions {
            self.execute(action);
        }
        drop(state);
    }

    /// Runs one action. Called with the state lock held; must not block.
    fn execute(self: &Arc<Self>, action: Action) {
        match action {
            Action::CancelAll => {
                self.tasks.cancel_all();
                self.api.cancel_all();
            }
            Action::ClearCache => self.lock_cache().clear(),
            Action::Search {
                generation,
                query,
                page,
            } => self.spawn_search(generation, &query, page),
            Action::DownloadBatch { generation, urls } => self.spawn_batch(generation, urls),
            Action::Notify(notification) => self.notifier.send(notification),
        }
    }

    fn spawn_search(self: &Arc<Self>, generation: Generation, query: &Query, page: Page) {
        let per_page = self.settings.per_page;
        let request = self.api.search_photos(query, page, per_page);
        let weak = Arc::downgrade(self);
        let span = tracing::debug_span!(
            "search",
            %query,
            page = page.get(),
            generation = generation.get()
        );

        self.tasks.spawn(
            &self.runtime,
            async move {
                let event = match request.await {
                    Ok(urls) => Event::SearchCompleted {
                        generation,
                        page,
                        urls,
                    },
                    Err(e) => Event::SearchFailed {
                        generation,
                        page,
                        message: e.to_string(),
                    },
                };
                deliver(&weak, event);
            }
            .instrument(span),
        );
    }

    fn spawn_batch(self: &Arc<Self>, generation: Generation, urls: Vec<String>) {
        let limit = self.settings.download_limit.max(1);
        let api = Arc::clone(&self.api);
        let weak = Arc::downgrade(self);
        let span = tracing::debug_span!(
            "batch",
            generation = generation.get(),
            url_count = urls.len(),
            limit
        );

        self.tasks.spawn(
            &self.runtime,
            async move {
                let permits = Arc::new(Semaphore::new(limit));
                let mut downloads = JoinSet::new();

                for url in urls {
                    let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                        break;
                    };
                    let request = api.load_image(&url);
                    let weak = weak.clone();

                    downloads.spawn(
                        async move {
                            let result = request.await;
                            drop(permit);

                            let event = match result {
                                Ok(bytes) => Event::ImageLoaded {
                                    generation,
                                    image: LoadedImage::new(url, bytes),
                                },
                                Err(e) => Event::ImageFailed {
                                    generation,
                                    url,
                                    message: e.to_string(),
                                },
                            };
                            deliver(&weak, event);
                        }
                        .in_current_span(),
                    );
                }

                while let Some(joined) = downloads.join_next().await {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "download task panicked");
                        }
                    }
                }

                deliver(&weak, Event::BatchDrained { generation });
            }
            .instrument(span),
        );
    }
}

/// Feeds a completion back into the controller, if it still exists.
fn deliver<A: PhotoApi>(inner: &Weak<Inner<A>>, event: Event) {
    if let Some(inner) = inner.upgrade() {
        inner.dispatch(event);
    }
}
