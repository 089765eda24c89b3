//! Downloaded image record.

use std::fmt;
use std::sync::Arc;

/// Raw image bytes shared between the controller, the cache, and observers.
pub type ImageBytes = Arc<[u8]>;

/// An image that finished downloading for the current query.
///
/// Images are appended in arrival order, which is not necessarily the order
/// their URLs were returned by the search API.
#[derive(Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// The "regular"-resolution URL the bytes were fetched from.
    pub url: String,
    /// Undecoded image bytes as served by the remote host.
    pub bytes: ImageBytes,
}

impl LoadedImage {
    /// Creates a record from a URL and its downloaded bytes.
    #[must_use]
    pub fn new(url: impl Into<String>, bytes: ImageBytes) -> Self {
        Self {
            url: url.into(),
            bytes,
        }
    }

    /// Size of the undecoded payload in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads are hundreds of kilobytes; log the size, not the contents.
impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("url", &self.url)
            .field("len", &self.bytes.len())
            .finish()
    }
}
