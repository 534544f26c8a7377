/// Pagination metadata calculator
///
/// This module provides the page metadata returned alongside every paged
/// listing. The calculation is pure: identical inputs always produce the same
/// descriptor, and no I/O is involved.
///
/// Note that `page` is deliberately NOT clamped to `total_pages` — requesting
/// page 9999 against a single page of data yields an empty result window with
/// valid-looking metadata. Callers distinguish "empty page but totalItems > 0"
/// (page out of range) from "totalItems == 0" (no records at all).
///
/// # Example
///
/// ```
/// use cashnotes_shared::pagination::Pagination;
///
/// let p = Pagination::new(25, 2, 10);
/// assert_eq!(p.offset, 10);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.next_page, Some(3));
/// assert_eq!(p.prev_page, Some(1));
/// ```
use serde::{Deserialize, Serialize};

/// Default page when the request carries none (or an invalid one)
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when the request carries none (or an invalid one)
pub const DEFAULT_LIMIT: i64 = 10;

/// Page metadata for a listing response
///
/// Serialized camelCase to match the API wire format:
/// `{currentPage, perPage, totalItems, totalPages, nextPage, prevPage, offset}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Requested page (1-based, floored to 1)
    pub current_page: i64,

    /// Requested page size (floored to the default)
    pub per_page: i64,

    /// Total number of matching items, independent of the page window
    pub total_items: i64,

    /// ceil(total_items / per_page)
    pub total_pages: i64,

    /// page + 1, or None when already at (or past) the last page
    pub next_page: Option<i64>,

    /// page - 1, or None when on the first page
    pub prev_page: Option<i64>,

    /// (page - 1) * per_page, for the store's OFFSET
    pub offset: i64,
}

impl Pagination {
    /// Computes page metadata for a listing
    ///
    /// * `total_items` - count of all matching records (≥ 0)
    /// * `page` - requested page; values < 1 fall back to 1
    /// * `limit` - requested page size; values < 1 fall back to 10
    pub fn new(total_items: i64, page: i64, limit: i64) -> Self {
        let page = if page < 1 { DEFAULT_PAGE } else { page };
        let limit = if limit < 1 { DEFAULT_LIMIT } else { limit };
        let total_items = total_items.max(0);

        let total_pages = (total_items + limit - 1) / limit;
        // Saturate: a huge but parseable page must not overflow the OFFSET.
        let offset = (page - 1).saturating_mul(limit);

        Self {
            current_page: page,
            per_page: limit,
            total_items,
            total_pages,
            next_page: if page < total_pages { Some(page + 1) } else { None },
            prev_page: if page > 1 { Some(page - 1) } else { None },
            offset,
        }
    }

    /// Computes page metadata from raw query-string values
    ///
    /// Unparsable input falls back to the defaults rather than erroring, so
    /// `?page=abc&limit=` behaves like `?page=1&limit=10`.
    pub fn from_raw(total_items: i64, page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(total_items, parse_or(page, DEFAULT_PAGE), parse_or(limit, DEFAULT_LIMIT))
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_total_pages() {
        let p = Pagination::new(25, 2, 10);
        assert_eq!(p.offset, 10);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.total_items, 25);
        assert_eq!(p.per_page, 10);
    }

    #[test]
    fn test_exact_multiple_total() {
        let p = Pagination::new(30, 1, 10);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn test_next_and_prev_at_bounds() {
        let first = Pagination::new(25, 1, 10);
        assert_eq!(first.prev_page, None);
        assert_eq!(first.next_page, Some(2));

        let middle = Pagination::new(25, 2, 10);
        assert_eq!(middle.prev_page, Some(1));
        assert_eq!(middle.next_page, Some(3));

        let last = Pagination::new(25, 3, 10);
        assert_eq!(last.prev_page, Some(2));
        assert_eq!(last.next_page, None);
    }

    #[test]
    fn test_page_not_clamped_to_total_pages() {
        let p = Pagination::new(1, 9999, 10);
        assert_eq!(p.current_page, 9999);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.offset, 99980);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, Some(9998));
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let p = Pagination::from_raw(1, Some("9223372036854775807"), Some("10"));
        assert_eq!(p.current_page, i64::MAX);
        assert_eq!(p.offset, i64::MAX);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, Some(i64::MAX - 1));
    }

    #[test]
    fn test_invalid_inputs_floor_to_defaults() {
        let p = Pagination::new(5, 0, -3);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.per_page, DEFAULT_LIMIT);

        let p = Pagination::new(5, -1, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.per_page, DEFAULT_LIMIT);
    }

    #[test]
    fn test_zero_total_items() {
        let p = Pagination::new(0, 1, 10);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, None);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_from_raw_lenient_parsing() {
        let p = Pagination::from_raw(25, Some("2"), Some("5"));
        assert_eq!(p.current_page, 2);
        assert_eq!(p.per_page, 5);
        assert_eq!(p.total_pages, 5);

        let p = Pagination::from_raw(25, Some("abc"), Some(""));
        assert_eq!(p.current_page, DEFAULT_PAGE);
        assert_eq!(p.per_page, DEFAULT_LIMIT);

        let p = Pagination::from_raw(25, None, None);
        assert_eq!(p.current_page, DEFAULT_PAGE);
        assert_eq!(p.per_page, DEFAULT_LIMIT);
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        assert_eq!(Pagination::new(42, 3, 7), Pagination::new(42, 3, 7));
    }
}
