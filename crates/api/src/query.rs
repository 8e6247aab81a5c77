//! Query-string helpers shared by the list handlers.
//!
//! List endpoints declare `page` and `page_size` next to their own filter
//! fields and build a `PageRequest` from them; out-of-range values are
//! clamped, never rejected.

/// Treat a blank filter value (`?status=`) as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
