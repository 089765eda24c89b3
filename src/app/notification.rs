//! Outbound notifications for the presentation layer.
//!
//! The controller publishes every observable change as a [`Notification`] on
//! a single unbounded channel. [`NotificationStream`] is the only receiving
//! end and cannot be cloned, so there is exactly one subscriber.
//!
//! Notifications are sent while the controller's state lock is held, so the
//! stream order is the order in which state transitions happened.

use crate::domain::LoadedImage;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// A change the presentation layer should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The image list changed; the grid should reload.
    ///
    /// `count` is the number of images available at the time of the change.
    ImagesUpdated {
        /// Current number of loaded images.
        count: usize,
    },

    /// The loading flag flipped. Sent only on an actual change.
    LoadingChanged(bool),

    /// The no-results flag flipped. Sent only on an actual change.
    NoResultsChanged(bool),

    /// An image was tapped; the detail view should show it.
    ImageSelected(LoadedImage),

    /// A search request for the current query failed.
    ///
    /// Non-fatal; the user may retry by resubmitting or scrolling.
    SearchFailed {
        /// Human-readable failure description.
        message: String,
    },

    /// Cached thumbnails were discarded because the image list was reset.
    CacheCleared,
}

/// Sending half owned by the controller.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    tx: UnboundedSender<Notification>,
}

impl Notifier {
    /// Publishes `notification`, dropping it if the subscriber has gone away.
    pub(crate) fn send(&self, notification: Notification) {
        tracing::trace!(?notification, "notify");
        let _ = self.tx.send(notification);
    }
}

/// The single subscription to a controller's notifications.
///
/// The stream ends (`recv` returns `None`) once the controller is dropped and
/// every in-flight task holding it has finished.
#[derive(Debug)]
pub struct NotificationStream {
    rx: UnboundedReceiver<Notification>,
}

impl NotificationStream {
    /// Waits for the next notification.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Returns the next notification if one is already queued.
    pub fn try_recv(&mut self) -> Option<Notification> {
        match self.rx.try_recv() {
            Ok(notification) => Some(notification),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drains every notification queued so far.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Creates a connected notifier and stream.
pub(crate) fn channel() -> (Notifier, NotificationStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, NotificationStream { rx })
}
