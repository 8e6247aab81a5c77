//! Shared response envelope types for API handlers.
//!
//! Single resources use `{ "data": ... }`; paginated lists add the total row
//! count and the effective page parameters.

use mes_core::pagination::PageRequest;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "total", "page", "page_size" }` envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Wrap one page of rows. `page` carries the clamped values actually used.
    pub fn new(data: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self {
            data,
            total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}
