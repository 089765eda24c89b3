//! Event handling and state transition logic.
//!
//! This module implements the transition function that processes user intents
//! and asynchronous completions, translating them into state changes and
//! action sequences. It never performs I/O and never blocks.
//!
//! # Architecture
//!
//! ```text
//! user intent ──┐
//!               ├─► Event ─► handle_event(&mut SearchState) ─► Vec<Action> ─► controller
//! completion ───┘                                                               │
//!      ▲                                                                        │
//!      └──────────────────────── spawned search / download tasks ◄──────────────┘
//! ```
//!
//! # Event Types
//!
//! - **Intents**: `SetQuery`, `LoadNextPage`, `Scrolled`, `ImageTapped`
//! - **Completions**: `SearchCompleted`, `SearchFailed`, `ImageLoaded`,
//!   `ImageFailed`, `BatchDrained`
//!
//! Every completion carries the [`Generation`] captured when its work was
//! dispatched. A completion whose generation differs from the state's is stale
//! and is dropped without touching the state.

use super::actions::Action;
use super::notification::Notification;
use super::state::{ScrollMetrics, SearchState};
use crate::domain::{Generation, LoadedImage, Page, Query};

/// Inputs to the search state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The search text changed. `None`, empty, or blank text resets everything.
    SetQuery(Option<String>),

    /// The grid asked for the next page.
    LoadNextPage,

    /// The grid scrolled; loads the next page when near the end.
    Scrolled(ScrollMetrics),

    /// The user tapped the image at this index.
    ImageTapped(usize),

    /// A search request returned.
    SearchCompleted {
        /// Generation captured at dispatch.
        generation: Generation,
        /// Page that was requested.
        page: Page,
        /// Extracted image URLs, possibly empty.
        urls: Vec<String>,
    },

    /// A search request failed.
    SearchFailed {
        /// Generation captured at dispatch.
        generation: Generation,
        /// Page that was requested.
        page: Page,
        /// Failure description.
        message: String,
    },

    /// One download of a batch succeeded.
    ImageLoaded {
        /// Generation captured at dispatch.
        generation: Generation,
        /// Downloaded image.
        image: LoadedImage,
    },

    /// One download of a batch failed.
    ImageFailed {
        /// Generation captured at dispatch.
        generation: Generation,
        /// URL that could not be fetched.
        url: String,
        /// Failure description.
        message: String,
    },

    /// Every download of a batch has settled.
    BatchDrained {
        /// Generation captured at dispatch.
        generation: Generation,
    },
}

impl Event {
    /// Short name used in spans and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetQuery(_) => "set_query",
            Self::LoadNextPage => "load_next_page",
            Self::Scrolled(_) => "scrolled",
            Self::ImageTapped(_) => "image_tapped",
            Self::SearchCompleted { .. } => "search_completed",
            Self::SearchFailed { .. } => "search_failed",
            Self::ImageLoaded { .. } => "image_loaded",
            Self::ImageFailed { .. } => "image_failed",
            Self::BatchDrained { .. } => "batch_drained",
        }
    }

    /// Generation a completion was dispatched under, `None` for intents.
    #[must_use]
    pub const fn generation(&self) -> Option<Generation> {
        match self {
            Self::SearchCompleted { generation, .. }
            | Self::SearchFailed { generation, .. }
            | Self::ImageLoaded { generation, .. }
            | Self::ImageFailed { generation, .. }
            | Self::BatchDrained { generation } => Some(*generation),
            Self::SetQuery(_) | Self::LoadNextPage | Self::Scrolled(_) | Self::ImageTapped(_) => {
                None
            }
        }
    }
}

/// Processes an event, mutates search state, and returns actions to execute.
///
/// # Example
///
/// ```rust
/// use unsplash_grid::app::{handle_event, Action, Event, Notification, SearchState};
///
/// let mut state = SearchState::default();
/// let actions = handle_event(&mut state, Event::SetQuery(Some("  ".into())));
///
/// assert!(actions.contains(&Action::CancelAll));
/// assert!(actions.contains(&Action::Notify(Notification::ImagesUpdated { count: 0 })));
/// ```
pub fn handle_event(state: &mut SearchState, event: Event) -> Vec<Action> {
    let _span = tracing::debug_span!(
        "handle_event",
        event = event.kind(),
        generation = state.generation.get()
    )
    .entered();

    if let Some(generation) = event.generation() {
        if generation != state.generation {
            tracing::trace!(stale = generation.get(), "dropping stale completion");
            return Vec::new();
        }
    }

    let mut actions = Vec::new();

    match event {
        Event::SetQuery(text) => match Query::parse(text.as_deref()) {
            Some(query) => start_search(state, query, &mut actions),
            None => reset(state, &mut actions),
        },
        Event::LoadNextPage => load_next_page(state, &mut actions),
        Event::Scrolled(metrics) => {
            if metrics.near_end(state.settings.scroll_threshold) {
                load_next_page(state, &mut actions);
            }
        }
        Event::ImageTapped(index) => match state.image(index) {
            Some(image) => {
                tracing::debug!(index, url = %image.url, "image selected");
                actions.push(Action::Notify(Notification::ImageSelected(image.clone())));
            }
            None => {
                tracing::debug!(index, available = state.images.len(), "tapped index out of range");
            }
        },
        Event::SearchCompleted {
            generation,
            page,
            urls,
        } => search_completed(state, generation, page, urls, &mut actions),
        Event::SearchFailed { page, message, .. } => {
            tracing::warn!(page = page.get(), error = %message, "search failed");
            state.search_in_flight = false;
            state.set_loading(false, &mut actions);
            actions.push(Action::Notify(Notification::SearchFailed { message }));
        }
        Event::ImageLoaded { image, .. } => {
            if !state.batch_active {
                return actions;
            }
            state.pending_downloads = state.pending_downloads.saturating_sub(1);

            if state.images.len() < state.urls.len() {
                state.images.push(image);
                let count = state.images.len();
                if count % state.settings.batch_notify_size.max(1) == 0 {
                    state.notify_images_updated(&mut actions);
                }
            }

            if state.pending_downloads == 0 {
                finish_batch(state, &mut actions);
            }
        }
        Event::ImageFailed { url, message, .. } => {
            tracing::warn!(%url, error = %message, "image download failed");
            if !state.batch_active {
                return actions;
            }
            state.pending_downloads = state.pending_downloads.saturating_sub(1);
            if state.pending_downloads == 0 {
                finish_batch(state, &mut actions);
            }
        }
        Event::BatchDrained { .. } => finish_batch(state, &mut actions),
    }

    actions
}

/// Supersedes any previous query and requests page 1 of `query`.
fn start_search(state: &mut SearchState, query: Query, actions: &mut Vec<Action>) {
    let had_results = !state.urls.is_empty();
    let generation = state.generation.advance();
    tracing::debug!(%query, generation = generation.get(), "starting search");

    state.query = Some(query.clone());
    state.clear_results();

    actions.push(Action::CancelAll);
    actions.push(Action::ClearCache);
    actions.push(Action::Notify(Notification::CacheCleared));
    if had_results {
        state.notify_images_updated(actions);
    }

    state.set_no_results(false, actions);
    state.search_in_flight = true;
    state.set_loading(true, actions);

    actions.push(Action::Search {
        generation,
        query,
        page: Page::FIRST,
    });
}

/// Hard reset: cancels everything and empties the grid.
fn reset(state: &mut SearchState, actions: &mut Vec<Action>) {
    let generation = state.generation.advance();
    tracing::debug!(generation = generation.get(), "query cleared");

    state.query = None;
    state.clear_results();

    actions.push(Action::CancelAll);
    actions.push(Action::ClearCache);
    actions.push(Action::Notify(Notification::CacheCleared));
    state.set_loading(false, actions);
    state.set_no_results(false, actions);
    state.notify_images_updated(actions);
}

fn load_next_page(state: &mut SearchState, actions: &mut Vec<Action>) {
    let Some(query) = state.query.clone() else {
        tracing::debug!("no active query, ignoring next page");
        return;
    };
    if state.page_in_flight() {
        tracing::debug!(phase = %state.phase(), "page load already in flight");
        return;
    }

    // Nothing appended yet means page 1 never succeeded; retry it.
    let page = if state.urls.is_empty() {
        Page::FIRST
    } else {
        state.page.next()
    };
    tracing::debug!(%query, page = page.get(), "loading next page");

    state.search_in_flight = true;
    state.set_loading(true, actions);
    actions.push(Action::Search {
        generation: state.generation,
        query,
        page,
    });
}

fn search_completed(
    state: &mut SearchState,
    generation: Generation,
    page: Page,
    urls: Vec<String>,
    actions: &mut Vec<Action>,
) {
    state.search_in_flight = false;

    if urls.is_empty() {
        tracing::debug!(page = page.get(), "no results");
        state.set_no_results(true, actions);
        state.set_loading(false, actions);
        return;
    }

    tracing::debug!(page = page.get(), url_count = urls.len(), "results received");
    state.set_no_results(false, actions);
    state.page = page;
    state.pending_downloads = urls.len();
    state.batch_active = true;
    state.urls.extend(urls.iter().cloned());

    actions.push(Action::DownloadBatch { generation, urls });
}

/// Closes the current batch. Idempotent.
fn finish_batch(state: &mut SearchState, actions: &mut Vec<Action>) {
    if !state.batch_active {
        return;
    }
    state.batch_active = false;
    state.pending_downloads = 0;

    tracing::debug!(
        images = state.images.len(),
        urls = state.urls.len(),
        "batch drained"
    );

    if state.images.len() != state.last_notified_count {
        state.notify_images_updated(actions);
    }
    state.set_loading(false, actions);
}
