//! Route definitions for the `/equipment` resource.
//!
//! Maintenance records live under `/equipment/maintenance`.

use axum::routing::get;
use axum::Router;

use crate::handlers::equipment;
use crate::state::AppState;

/// Routes mounted at `/equipment`.
///
/// ```text
/// GET    /                       -> list
/// POST   /                       -> create
/// GET    /types                  -> types
/// GET    /statistics             -> statistics
/// GET    /upcoming-maintenance   -> upcoming_maintenance (?days=)
/// GET    /{id}                   -> get_by_id
/// PUT    /{id}                   -> update
/// DELETE /{id}                   -> delete
///
/// GET    /maintenance            -> list_maintenance
/// POST   /maintenance            -> create_maintenance
/// GET    /maintenance/{id}       -> get_maintenance
/// PUT    /maintenance/{id}       -> update_maintenance
/// DELETE /maintenance/{id}       -> delete_maintenance
/// ```
pub fn router() -> Router<AppState> {
    let maintenance_routes = Router::new()
        .route(
            "/",
            get(equipment::list_maintenance).post(equipment::create_maintenance),
        )
        .route(
            "/{id}",
            get(equipment::get_maintenance)
                .put(equipment::update_maintenance)
                .delete(equipment::delete_maintenance),
        );

    Router::new()
        .route("/", get(equipment::list).post(equipment::create))
        .route("/types", get(equipment::types))
        .route("/statistics", get(equipment::statistics))
        .route("/upcoming-maintenance", get(equipment::upcoming_maintenance))
        .route(
            "/{id}",
            get(equipment::get_by_id)
                .put(equipment::update)
                .delete(equipment::delete),
        )
        .nest("/maintenance", maintenance_routes)
}
