pub mod equipment;
pub mod health;
pub mod materials;
pub mod production;
pub mod products;
pub mod quality;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/register, /login, /refresh        public
/// /users/logout, /profile, /password       authenticated
/// /users/list                              admin only
///
/// /products[/{id}], /products/all          product catalog
///
/// /production/orders[/{id}]                production orders
/// /production/statistics                   dashboard aggregates
///
/// /materials[/{id}]                        material master data
/// /materials/transactions                  stock ledger (list, record)
/// /materials/low-stock, /materials/types
///
/// /quality/standards[/{id}], /types        quality standards
/// /quality/inspections[/{id}]              inspections
/// /quality/statistics                      pass/fail rates
///
/// /equipment[/{id}], /types, /statistics   equipment
/// /equipment/maintenance[/{id}]            maintenance records
/// /equipment/upcoming-maintenance          scheduled maintenance window
/// ```
///
/// Everything except register/login/refresh requires a bearer token; the
/// `AuthUser` and `RequireAdmin` extractors enforce it per handler.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/production", production::router())
        .nest("/materials", materials::router())
        .nest("/quality", quality::router())
        .nest("/equipment", equipment::router())
}
