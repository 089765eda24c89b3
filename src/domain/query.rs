//! Query, page, and generation value types.
//!
//! These newtypes carry the small amount of identity the search pipeline
//! needs: the active keyword, the 1-based pagination cursor, and the epoch
//! counter used to discard results from superseded searches.

use std::fmt;

/// A normalized, non-empty search keyword.
///
/// Construct with [`Query::parse`], which trims surrounding whitespace and
/// rejects empty input. An absent query means "no active search".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Normalizes raw text from the search field.
    ///
    /// Returns `None` for `None`, empty, or whitespace-only input, which the
    /// controller treats as a hard reset.
    ///
    /// # Examples
    ///
    /// ```
    /// use unsplash_grid::domain::Query;
    ///
    /// assert_eq!(Query::parse(Some("  cats ")).unwrap().as_str(), "cats");
    /// assert!(Query::parse(Some("   ")).is_none());
    /// assert!(Query::parse(None).is_none());
    /// ```
    #[must_use]
    pub fn parse(text: Option<&str>) -> Option<Self> {
        let trimmed = text?.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the keyword as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 1-based pagination cursor into the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Page(u32);

impl Page {
    /// The first page of every query.
    pub const FIRST: Self = Self(1);

    /// Creates a page cursor, clamping zero up to the first page.
    #[must_use]
    pub const fn new(page: u32) -> Self {
        if page == 0 {
            Self::FIRST
        } else {
            Self(page)
        }
    }

    /// Returns the following page.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the raw page number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Epoch counter distinguishing the current query cycle from superseded ones.
///
/// Every asynchronous continuation captures the generation at dispatch time.
/// When it completes, its result is applied only if the controller's
/// generation is still the same.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Advances to a new epoch, invalidating everything dispatched before.
    pub fn advance(&mut self) -> Self {
        self.0 = self.0.wrapping_add(1);
        *self
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
