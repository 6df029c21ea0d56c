//! crates/gramseva_core/src/directory.rs
//!
//! The directory query model: typed filters, sort keys and pagination for
//! the provider listing pipeline. Normalization happens here so every store
//! implementation sees the same, already-defaulted request.

use serde::Serialize;

use crate::catalog::ServiceCategory;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Listing order. Unknown keys normalize to `None`, which pushes no explicit
/// order at all (insertion/store order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// rating_avg descending. The default.
    Rating,
    /// created_at descending.
    Newest,
    /// price_min ascending.
    PriceLow,
}

impl SortKey {
    pub fn from_param(s: &str) -> Option<SortKey> {
        match s {
            "rating" => Some(SortKey::Rating),
            "newest" => Some(SortKey::Newest),
            "price_low" => Some(SortKey::PriceLow),
            _ => None,
        }
    }
}

/// A normalized directory request. All filters are conjunctive; the search
/// term alone expands to two disjunctive sub-clauses (about substring OR
/// specific_services membership).
#[derive(Debug, Clone)]
pub struct DirectoryQuery {
    pub category: Option<ServiceCategory>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub available_only: bool,
    pub page: u32,
    pub page_size: u32,
    pub sort: Option<SortKey>,
}

impl DirectoryQuery {
    /// Builds a normalized query from raw request parameters. Malformed or
    /// non-positive page values fall back to the documented defaults rather
    /// than failing.
    pub fn new(
        category: Option<ServiceCategory>,
        location: Option<String>,
        search: Option<String>,
        available_only: bool,
        page: Option<i64>,
        page_size: Option<i64>,
        sort_param: Option<&str>,
    ) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p as u32,
            _ => DEFAULT_PAGE,
        };
        let page_size = match page_size {
            Some(s) if s >= 1 => s as u32,
            _ => DEFAULT_PAGE_SIZE,
        };
        // Absent sort parameter means the default order; a present-but-unknown
        // key means no explicit order.
        let sort = match sort_param {
            None => Some(SortKey::Rating),
            Some(s) => SortKey::from_param(s),
        };
        DirectoryQuery {
            category,
            location: location.filter(|s| !s.is_empty()),
            search: search.filter(|s| !s.is_empty()),
            available_only,
            page,
            page_size,
            sort,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// Pagination metadata returned alongside every listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(limit));
        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(page: Option<i64>, size: Option<i64>, sort: Option<&str>) -> DirectoryQuery {
        DirectoryQuery::new(None, None, None, false, page, size, sort)
    }

    #[test]
    fn malformed_page_falls_back_to_defaults() {
        let query = q(Some(0), Some(-3), None);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 12);

        let query = q(None, None, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 12);
    }

    #[test]
    fn offset_is_one_indexed() {
        let query = q(Some(2), Some(12), None);
        assert_eq!(query.offset(), 12);
        assert_eq!(query.limit(), 12);
    }

    #[test]
    fn missing_sort_defaults_to_rating() {
        assert_eq!(q(None, None, None).sort, Some(SortKey::Rating));
    }

    #[test]
    fn unknown_sort_key_yields_no_explicit_order() {
        // Latent inconsistency carried over from the original behavior: an
        // unrecognized key drops ordering entirely instead of defaulting.
        assert_eq!(q(None, None, Some("cheapest")).sort, None);
        assert_eq!(q(None, None, Some("price_low")).sort, Some(SortKey::PriceLow));
    }

    #[test]
    fn empty_filters_are_dropped() {
        let query = DirectoryQuery::new(
            None,
            Some(String::new()),
            Some(String::new()),
            false,
            None,
            None,
            None,
        );
        assert!(query.location.is_none());
        assert!(query.search.is_none());
    }

    #[test]
    fn total_pages_is_a_ceiling() {
        assert_eq!(Pagination::new(2, 12, 25).total_pages, 3);
        assert_eq!(Pagination::new(1, 12, 24).total_pages, 2);
        assert_eq!(Pagination::new(1, 12, 0).total_pages, 0);
    }
}
