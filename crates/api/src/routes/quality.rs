//! Route definitions for the `/quality` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::quality;
use crate::state::AppState;

/// Routes mounted at `/quality`.
///
/// ```text
/// GET    /standards             -> list_standards
/// POST   /standards             -> create_standard
/// GET    /standards/types       -> standard_types
/// GET    /standards/{id}        -> get_standard
/// PUT    /standards/{id}        -> update_standard
/// DELETE /standards/{id}        -> delete_standard
///
/// GET    /inspections           -> list_inspections
/// POST   /inspections           -> create_inspection
/// GET    /inspections/{id}      -> get_inspection
/// PUT    /inspections/{id}      -> update_inspection
/// DELETE /inspections/{id}      -> delete_inspection
///
/// GET    /statistics            -> statistics
/// ```
pub fn router() -> Router<AppState> {
    let standard_routes = Router::new()
        .route(
            "/",
            get(quality::list_standards).post(quality::create_standard),
        )
        .route("/types", get(quality::standard_types))
        .route(
            "/{id}",
            get(quality::get_standard)
                .put(quality::update_standard)
                .delete(quality::delete_standard),
        );

    let inspection_routes = Router::new()
        .route(
            "/",
            get(quality::list_inspections).post(quality::create_inspection),
        )
        .route(
            "/{id}",
            get(quality::get_inspection)
                .put(quality::update_inspection)
                .delete(quality::delete_inspection),
        );

    Router::new()
        .nest("/standards", standard_routes)
        .nest("/inspections", inspection_routes)
        .route("/statistics", get(quality::statistics))
}
