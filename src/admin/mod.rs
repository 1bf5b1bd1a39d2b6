pub mod dto;
pub mod handlers;

use axum::{
    routing::{get, put},
    Router,
};

use crate::state::AppState;

/// Nested under `/admin`; every handler requires the `X-Admin-Username`
/// header to name a user whose role is `admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::stats))
        .route("/all-markers", get(handlers::all_markers))
        .route("/users", get(handlers::list_users))
        .route(
            "/markers/:id",
            put(handlers::update_marker).delete(handlers::delete_marker),
        )
        .route(
            "/users/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
}
