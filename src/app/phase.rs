//! Derived pipeline phase.
//!
//! The controller exposes only the `loading` and `no_results` flags, but the
//! underlying state always sits in one of a few phases:
//!
//! ```text
//!            set_query(q)             results          all downloads settled
//!   Idle ───────────────► Searching ──────────► Downloading ──────────► Ready
//!    ▲                        │  no results                               │
//!    │                        └────────────► NoResults                    │
//!    │                                                     load_next_page │
//!    │  set_query(None)                     Searching ◄───────────────────┘
//!    └────────────── (from any phase)
//! ```
//!
//! [`Phase`] is computed from [`SearchState`](super::SearchState) on demand and
//! is used for logging and snapshots; no transition reads it.

use std::fmt;

/// Phase of the search pipeline for the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No active query.
    Idle,
    /// A search request is outstanding.
    Searching,
    /// Image downloads for the latest page are outstanding.
    Downloading {
        /// Downloads not yet settled.
        pending: usize,
    },
    /// The latest search returned no results.
    NoResults,
    /// Everything requested so far has settled.
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Searching => f.write_str("searching"),
            Self::Downloading { pending } => write!(f, "downloading ({pending} pending)"),
            Self::NoResults => f.write_str("no results"),
            Self::Ready => f.write_str("ready"),
        }
    }
}
