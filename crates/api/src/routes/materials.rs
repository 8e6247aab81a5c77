//! Route definitions for the `/materials` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::materials;
use crate::state::AppState;

/// Routes mounted at `/materials`.
///
/// Static segments take precedence over `/{id}`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create
/// GET    /transactions   -> list_transactions
/// POST   /transactions   -> record_transaction
/// GET    /low-stock      -> low_stock
/// GET    /types          -> types
/// GET    /{id}           -> get_by_id
/// PUT    /{id}           -> update
/// DELETE /{id}           -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(materials::list).post(materials::create))
        .route(
            "/transactions",
            get(materials::list_transactions).post(materials::record_transaction),
        )
        .route("/low-stock", get(materials::low_stock))
        .route("/types", get(materials::types))
        .route(
            "/{id}",
            get(materials::get_by_id)
                .put(materials::update)
                .delete(materials::delete),
        )
}
