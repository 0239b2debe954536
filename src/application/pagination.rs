//! Numbered pagination over offset/limit listings.
//!
//! Listings address pages with a `?page=N` query parameter. Requests outside
//! the valid range are clamped rather than rejected: anything unparsable or
//! below one reads as the first page, anything past the end reads as the
//! last page.

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw `?page=` query input. Kept as a string so junk input clamps instead
/// of failing extraction.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A 1-based page request, already clamped at the lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(u32);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    pub fn new(number: u32) -> Self {
        Self(number.max(1))
    }

    /// Parse a raw query value; non-numeric or non-positive input reads as
    /// the first page.
    pub fn from_query(raw: Option<&str>) -> Self {
        let parsed = raw
            .map(str::trim)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(1);
        Self::new(parsed)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<&PageQuery> for PageNumber {
    fn from(query: &PageQuery) -> Self {
        Self::from_query(query.page.as_deref())
    }
}

/// Resolved page coordinates for a listing of `total_count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl PageWindow {
    /// Clamp a requested page against the item count. An empty listing still
    /// has one (empty) page so templates always have a window to render.
    pub fn compute(requested: PageNumber, page_size: u32, total_count: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_count
            .div_ceil(u64::from(page_size))
            .clamp(1, u64::from(u32::MAX)) as u32;
        let number = requested.get().min(total_pages);

        Self {
            number,
            total_pages,
            page_size,
            total_count,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// One page of items together with its window metadata.
#[derive(Debug, Clone)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let first = PageWindow::compute(PageNumber::new(1), 10, 13);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.offset(), 0);
        assert_eq!(first.limit(), 10);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let second = PageWindow::compute(PageNumber::new(2), 10, 13);
        assert_eq!(second.offset(), 10);
        assert!(second.has_previous());
        assert!(!second.has_next());
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let window = PageWindow::compute(PageNumber::new(99), 10, 13);
        assert_eq!(window.number, 2);
    }

    #[test]
    fn junk_query_values_read_as_first_page() {
        for raw in [None, Some("abc"), Some("0"), Some("-3"), Some("")] {
            assert_eq!(PageNumber::from_query(raw), PageNumber::FIRST, "input {raw:?}");
        }
        assert_eq!(PageNumber::from_query(Some("2")).get(), 2);
    }

    #[test]
    fn empty_listing_has_a_single_empty_page() {
        let window = PageWindow::compute(PageNumber::new(3), 10, 0);
        assert_eq!(window.number, 1);
        assert_eq!(window.total_pages, 1);
        assert!(!window.has_previous());
        assert!(!window.has_next());
    }
}
