//! Actions representing side effects to be executed by the controller.
//!
//! [`handle_event`](super::handle_event) never performs I/O. It returns a
//! `Vec<Action>` describing what must happen next, and the
//! [`SearchController`](super::SearchController) executes those actions in
//! order while still holding the state lock. Spawning and aborting tasks never
//! block, so holding the lock is cheap and keeps a `CancelAll` from overtaking
//! a spawn issued by an earlier event.
//!
//! # Example
//!
//! ```rust
//! use unsplash_grid::app::{handle_event, Action, Event, SearchState};
//!
//! let mut state = SearchState::default();
//! let actions = handle_event(&mut state, Event::SetQuery(Some("cats".into())));
//! assert!(actions.iter().any(|a| matches!(a, Action::Search { .. })));
//! ```

use super::notification::Notification;
use crate::domain::{Generation, Page, Query};

/// Commands representing side effects to be executed by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Aborts every outstanding search, download driver, and API request.
    CancelAll,

    /// Drops every cached thumbnail.
    ClearCache,

    /// Issues a search request whose completion is tagged with `generation`.
    Search {
        /// Generation captured at dispatch.
        generation: Generation,
        /// Query to search for.
        query: Query,
        /// Page to request.
        page: Page,
    },

    /// Downloads `urls` with bounded concurrency.
    ///
    /// Each completion is reported as an `ImageLoaded` or `ImageFailed` event,
    /// followed by one `BatchDrained` once every download has settled.
    DownloadBatch {
        /// Generation captured at dispatch.
        generation: Generation,
        /// URLs of this page, in response order.
        urls: Vec<String>,
    },

    /// Publishes a notification to the subscriber.
    Notify(Notification),
}
