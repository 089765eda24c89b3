//! Search state container.
//!
//! This module defines [`SearchState`], the single source of truth for the
//! active query, the pagination cursor, the accumulated URL and image lists,
//! and the externally visible flags. Only [`handle_event`](super::handle_event)
//! mutates it, and only under the controller's lock.
//!
//! # State Components
//!
//! - **Query**: Active keyword, `None` when idle
//! - **Page**: Last page whose results were appended
//! - **URLs / Images**: Ordered result URLs and images in arrival order
//! - **Flags**: `loading` and `no_results`, mirrored to observers on change
//! - **Generation**: Epoch used to discard superseded completions
//! - **Bookkeeping**: In-flight search flag and pending download count

use super::actions::Action;
use super::notification::Notification;
use super::phase::Phase;
use crate::domain::{Generation, LoadedImage, Page, Query};
use crate::Config;

/// Tunables for the search pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    /// Page size requested from the API.
    pub per_page: u32,
    /// Maximum concurrent downloads per batch.
    pub download_limit: usize,
    /// Notify `ImagesUpdated` whenever the image count reaches a multiple of this.
    ///
    /// Only the image count is published at these boundaries. `loading` stays
    /// set until the whole batch has drained.
    pub batch_notify_size: usize,
    /// Thumbnail cache capacity.
    pub cache_capacity: usize,
    /// Distance from the content end that triggers the next page.
    pub scroll_threshold: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            per_page: 30,
            download_limit: 5,
            batch_notify_size: 10,
            cache_capacity: 100,
            scroll_threshold: 50.0,
        }
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            per_page: config.per_page,
            download_limit: config.download_limit,
            batch_notify_size: config.batch_notify_size,
            cache_capacity: config.cache_capacity,
            scroll_threshold: config.scroll_threshold,
        }
    }
}

/// Scroll position reported by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top of the content.
    pub offset: f64,
    /// Total height of the content.
    pub content_height: f64,
    /// Height of the visible viewport.
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Returns `true` when the bottom of the viewport is within `threshold` of
    /// the end of non-empty content.
    ///
    /// ```
    /// use unsplash_grid::app::ScrollMetrics;
    ///
    /// let metrics = ScrollMetrics { offset: 460.0, content_height: 1000.0, viewport_height: 500.0 };
    /// assert!(metrics.near_end(50.0));
    /// assert!(!metrics.near_end(30.0));
    /// ```
    #[must_use]
    pub fn near_end(&self, threshold: f64) -> bool {
        self.content_height > 0.0
            && self.offset + self.viewport_height >= self.content_height - threshold
    }
}

/// Point-in-time view of the search state for display and debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    /// Active query, if any.
    pub query: Option<String>,
    /// Last page appended.
    pub page: u32,
    /// Result URLs accumulated so far.
    pub url_count: usize,
    /// Images downloaded so far.
    pub image_count: usize,
    /// Whether a search or download is outstanding.
    pub loading: bool,
    /// Whether the latest search returned nothing.
    pub no_results: bool,
    /// Current generation.
    pub generation: u64,
    /// Derived pipeline phase.
    pub phase: Phase,
}

/// Central search state.
///
/// Invariant: `images.len() <= urls.len()` at all times.
#[derive(Debug, Clone)]
pub struct SearchState {
    /// Active normalized query; `None` means idle.
    pub query: Option<Query>,

    /// Last page whose results were appended to `urls`.
    ///
    /// Reset to 1 on every new query. Advances only when a page returns a
    /// non-empty result.
    pub page: Page,

    /// Result URLs in API response order, across all pages.
    pub urls: Vec<String>,

    /// Downloaded images in arrival order.
    pub images: Vec<LoadedImage>,

    /// `true` while a search or any download of the current generation is outstanding.
    pub loading: bool,

    /// `true` after a search returned an empty result list.
    pub no_results: bool,

    /// Epoch of the current query cycle.
    pub generation: Generation,

    /// Pipeline tunables.
    pub settings: SearchSettings,

    pub(crate) search_in_flight: bool,
    pub(crate) pending_downloads: usize,
    pub(crate) batch_active: bool,
    pub(crate) last_notified_count: usize,
}

impl SearchState {
    /// Creates an idle state.
    #[must_use]
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            query: None,
            page: Page::FIRST,
            urls: Vec::new(),
            images: Vec::new(),
            loading: false,
            no_results: false,
            generation: Generation::default(),
            settings,
            search_in_flight: false,
            pending_downloads: 0,
            batch_active: false,
            last_notified_count: 0,
        }
    }

    /// Number of images downloaded so far.
    #[must_use]
    pub fn number_of_images(&self) -> usize {
        self.images.len()
    }

    /// Returns the image at `index`, or `None` if it has not arrived.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&LoadedImage> {
        self.images.get(index)
    }

    /// Returns `true` while a search or its download batch is outstanding.
    #[must_use]
    pub const fn page_in_flight(&self) -> bool {
        self.search_in_flight || self.batch_active
    }

    /// Derives the current pipeline phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.query.is_none() {
            Phase::Idle
        } else if self.search_in_flight {
            Phase::Searching
        } else if self.batch_active {
            Phase::Downloading {
                pending: self.pending_downloads,
            }
        } else if self.no_results {
            Phase::NoResults
        } else {
            Phase::Ready
        }
    }

    /// Captures a snapshot for display.
    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.as_ref().map(ToString::to_string),
            page: self.page.get(),
            url_count: self.urls.len(),
            image_count: self.images.len(),
            loading: self.loading,
            no_results: self.no_results,
            generation: self.generation.get(),
            phase: self.phase(),
        }
    }

    /// Drops accumulated results and batch bookkeeping, keeping the query.
    pub(crate) fn clear_results(&mut self) {
        self.page = Page::FIRST;
        self.urls.clear();
        self.images.clear();
        self.search_in_flight = false;
        self.pending_downloads = 0;
        self.batch_active = false;
        self.last_notified_count = 0;
    }

    pub(crate) fn set_loading(&mut self, loading: bool, actions: &mut Vec<Action>) {
        if self.loading != loading {
            self.loading = loading;
            actions.push(Action::Notify(Notification::LoadingChanged(loading)));
        }
    }

    pub(crate) fn set_no_results(&mut self, no_results: bool, actions: &mut Vec<Action>) {
        if self.no_results != no_results {
            self.no_results = no_results;
            actions.push(Action::Notify(Notification::NoResultsChanged(no_results)));
        }
    }

    /// Announces the current image count and remembers it.
    pub(crate) fn notify_images_updated(&mut self, actions: &mut Vec<Action>) {
        let count = self.images.len();
        self.last_notified_count = count;
        actions.push(Action::Notify(Notification::ImagesUpdated { count }));
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(SearchSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_near_end_requires_content() {
        let empty = ScrollMetrics {
            offset: 0.0,
            content_height: 0.0,
            viewport_height: 800.0,
        };
        assert!(!empty.near_end(50.0));

        let top = ScrollMetrics {
            offset: 0.0,
            content_height: 3000.0,
            viewport_height: 800.0,
        };
        assert!(!top.near_end(50.0));

        let bottom = ScrollMetrics {
            offset: 2150.0,
            ..top
        };
        assert!(bottom.near_end(50.0));
    }

    #[test]
    fn test_flag_setters_are_edge_triggered() {
        let mut state = SearchState::default();
        let mut actions = Vec::new();

        state.set_loading(false, &mut actions);
        assert!(actions.is_empty());

        state.set_loading(true, &mut actions);
        state.set_loading(true, &mut actions);
        state.set_no_results(true, &mut actions);
        assert_eq!(
            actions,
            vec![
                Action::Notify(Notification::LoadingChanged(true)),
                Action::Notify(Notification::NoResultsChanged(true)),
            ]
        );
    }

    #[test]
    fn test_phase_and_snapshot() {
        let mut state = SearchState::default();
        assert_eq!(state.phase(), Phase::Idle);

        state.query = Query::parse(Some("owls"));
        state.search_in_flight = true;
        assert_eq!(state.phase(), Phase::Searching);

        state.search_in_flight = false;
        state.batch_active = true;
        state.pending_downloads = 3;
        state.urls = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(state.phase(), Phase::Downloading { pending: 3 });

        state.batch_active = false;
        state.images.push(LoadedImage::new("a", Arc::from(&[1u8][..])));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.query.as_deref(), Some("owls"));
        assert_eq!((snapshot.url_count, snapshot.image_count), (3, 1));
    }

    #[test]
    fn test_image_lookup_out_of_range() {
        let state = SearchState::default();
        assert!(state.image(0).is_none());
        assert!(state.image(usize::MAX).is_none());
    }
}
