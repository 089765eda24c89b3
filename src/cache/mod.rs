//! Bounded cache of decoded thumbnails keyed by grid index.
//!
//! Keys are positions in the controller's image list, not URLs, so the cache
//! is only valid for one query and must be cleared whenever the list is reset.

use crate::domain::Result;
use image::DynamicImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Capacity used when a zero capacity is requested.
pub const DEFAULT_CAPACITY: usize = 100;

/// Least-recently-used map from grid index to decoded image.
#[derive(Debug)]
pub struct ImageCache {
    entries: LruCache<usize, Arc<DynamicImage>>,
}

impl ImageCache {
    /// Creates a cache holding at most `capacity` images.
    ///
    /// A zero capacity falls back to [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);

        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Returns the image at `index`, marking it most recently used.
    pub fn get(&mut self, index: usize) -> Option<Arc<DynamicImage>> {
        self.entries.get(&index).cloned()
    }

    /// Stores `image` at `index`, evicting the least recently used entry if full.
    pub fn set(&mut self, index: usize, image: Arc<DynamicImage>) {
        self.entries.put(index, image);
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of images held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

/// Decodes raw image bytes, guessing the format from their header.
///
/// # Errors
///
/// Returns [`crate::SearchError::Decode`] for unsupported or corrupt data.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn solid(width: u32) -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgb8(RgbImage::new(width, 1)))
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = ImageCache::new(2);
        cache.set(0, solid(1));
        cache.set(1, solid(2));

        assert!(cache.get(0).is_some());
        cache.set(2, solid(3));

        assert!(cache.get(1).is_none());
        assert_eq!(cache.get(0).map(|img| img.width()), Some(1));
        assert_eq!(cache.get(2).map(|img| img.width()), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut cache = ImageCache::new(0);
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);

        cache.set(4, solid(1));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(4).is_none());
    }

    #[test]
    fn test_decode_png_and_garbage() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(3, 2))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let decoded = decode(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));

        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, crate::SearchError::Decode(_)));
    }
}
