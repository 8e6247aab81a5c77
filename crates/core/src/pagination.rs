//! Page/page-size clamping for list endpoints.
//!
//! Lists are addressed by a 1-based page number and a page size. Values
//! outside the accepted range are clamped rather than rejected.

use serde::Serialize;

/// Page number used when the caller supplies none.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the caller supplies none (or a non-positive value).
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A clamped page request, convertible to SQL `LIMIT` / `OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Build a page request from raw query values.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: clamp_page(page),
            page_size: clamp_page_size(page_size),
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Rows to skip. Saturates for page numbers far past the last row, which
    /// then simply yield an empty page.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Clamp a requested page number to `>= 1`.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(DEFAULT_PAGE).max(1)
}

/// Clamp a requested page size into `[1, MAX_PAGE_SIZE]`.
///
/// Non-positive sizes fall back to [`DEFAULT_PAGE_SIZE`].
pub fn clamp_page_size(page_size: Option<i64>) -> i64 {
    match page_size {
        Some(size) if size > 0 => size.min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_absent() {
        let page = PageRequest::new(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn page_floors_at_one() {
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(clamp_page(Some(4)), 4);
    }

    #[test]
    fn page_size_capped_at_max() {
        assert_eq!(clamp_page_size(Some(500)), 100);
        assert_eq!(clamp_page_size(Some(100)), 100);
    }

    #[test]
    fn non_positive_page_size_uses_default() {
        assert_eq!(clamp_page_size(Some(0)), 10);
        assert_eq!(clamp_page_size(Some(-1)), 10);
    }

    #[test]
    fn offset_is_zero_based() {
        let page = PageRequest::new(Some(3), Some(20));
        assert_eq!(page.limit(), 20);
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn huge_page_number_saturates_offset() {
        let page = PageRequest::new(Some(i64::MAX), Some(100));
        assert_eq!(page.page, i64::MAX);
        assert_eq!(page.offset(), i64::MAX);
        assert!(page.offset() >= 0);
    }
}
