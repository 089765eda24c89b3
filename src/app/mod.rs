//! Application layer coordinating state, events, and actions.
//!
//! This module is the search pipeline's core: a pure transition function over
//! [`SearchState`] and the [`SearchController`] runtime that executes its
//! actions on tokio.
//!
//! # Architecture
//!
//! ```text
//! User Intent → Event → handle_event → State Mutations → Actions → Side Effects
//!                            ↑                                         ↓
//!                            └───────── Search / Download Completions ─┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands emitted by the event handler
//! - [`controller`]: Runtime executing actions and exposing the public API
//! - [`handler`]: Event processing and state transitions
//! - [`notification`]: Outbound notification stream
//! - [`phase`]: Derived pipeline phase
//! - [`state`]: Central search state, settings, and snapshots

pub mod actions;
pub mod controller;
pub mod handler;
pub mod notification;
pub mod phase;
pub mod state;

pub use actions::Action;
pub use controller::{decode_selected, SearchController};
pub use handler::{handle_event, Event};
pub use notification::{Notification, NotificationStream};
pub use phase::Phase;
pub use state::{ScrollMetrics, SearchSettings, SearchSnapshot, SearchState};
