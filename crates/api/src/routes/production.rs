//! Route definitions for the `/production` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::production;
use crate::state::AppState;

/// Routes mounted at `/production`.
///
/// ```text
/// GET    /orders       -> list
/// POST   /orders       -> create
/// GET    /orders/{id}  -> get_by_id
/// PUT    /orders/{id}  -> update (edits, status changes, progress)
/// DELETE /orders/{id}  -> delete
/// GET    /statistics   -> statistics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(production::list).post(production::create))
        .route(
            "/orders/{id}",
            get(production::get_by_id)
                .put(production::update)
                .delete(production::delete),
        )
        .route("/statistics", get(production::statistics))
}
