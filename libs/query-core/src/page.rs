use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::QueryError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Requested page window as it arrives from the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Page metadata returned next to a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub count: u64,
    pub page_size: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

/// Page arithmetic over an ordered result of `count` items. Pure, no I/O.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    count: u64,
    current_page: u64,
    page_size: u64,
}

impl Pagination {
    pub fn new(count: u64, current_page: u64, page_size: u64) -> Result<Self, QueryError> {
        if current_page == 0 || page_size == 0 {
            return Err(QueryError::InvalidPage {
                page: current_page,
                page_size,
            });
        }
        Ok(Self {
            count,
            current_page,
            page_size,
        })
    }

    pub fn from_params(count: u64, params: PageParams) -> Result<Self, QueryError> {
        Self::new(count, params.page, params.page_size)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Index of the first item on the current page.
    pub fn offset(&self) -> u64 {
        (self.current_page - 1).saturating_mul(self.page_size)
    }

    /// `[offset, offset + page_size)`; may lie past `count`.
    pub fn window(&self) -> Range<u64> {
        let start = self.offset();
        start..start.saturating_add(self.page_size)
    }

    /// The current page's items out of the full ordered sequence.
    /// Pages past the end yield an empty slice.
    pub fn current_page_slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        if self.count == 0 {
            return &[];
        }
        let len = items.len() as u64;
        let Range { start, end } = self.window();
        let start = start.min(len) as usize;
        let end = end.min(len) as usize;
        &items[start..end]
    }

    pub fn total_pages(&self) -> u64 {
        if self.count == 0 {
            return 0;
        }
        self.count.div_ceil(self.page_size)
    }

    pub fn info(&self) -> PaginationInfo {
        PaginationInfo {
            count: self.count,
            page_size: self.page_size,
            current_page: self.current_page,
            total_pages: self.total_pages(),
        }
    }
}
