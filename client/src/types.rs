//! Shared response types

use serde::{Deserialize, Serialize};

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub content: Vec<T>,
    /// Items across all pages
    pub total_elements: u64,
    /// Number of pages
    pub total_pages: u32,
    /// Requested page size
    pub size: u32,
    /// Zero-based page index
    pub number: u32,
}

impl<T> Page<T> {
    /// Whether another page follows this one
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    /// Whether the page holds no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
