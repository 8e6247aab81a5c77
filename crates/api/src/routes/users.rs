//! Route definitions for the `/users` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST /register  -> register (public; role honoured for admins only)
/// POST /login     -> login (public)
/// POST /refresh   -> refresh (public)
/// POST /logout    -> logout
/// GET  /profile   -> get_profile
/// PUT  /profile   -> update_profile
/// PUT  /password  -> change_password
/// GET  /list      -> list (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/refresh", post(users::refresh))
        .route("/logout", post(users::logout))
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/password", put(users::change_password))
        .route("/list", get(users::list))
}
