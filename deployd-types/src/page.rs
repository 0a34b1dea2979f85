//! Paging for plan searches.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not give one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a caller may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A zero-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping `size` to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Returns the request with its size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.page, self.size)
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Wraps `content` as the page described by `request`.
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
        }
    }

    /// Number of pages needed for `total_elements`.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    /// Applies `f` to every item, keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}
