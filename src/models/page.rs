use serde::{Deserialize, Serialize};

use crate::utils::total_pages;

/// One zero-based page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page_index: i64, page_size: i64, total_count: i64) -> Self {
        Self {
            items,
            page_index,
            page_size,
            total_count,
            total_pages: total_pages(total_count, page_size),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0 && self.total_pages > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
