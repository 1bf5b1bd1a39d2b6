pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{
    routing::{get, put},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    // `:key` is a username on GET and a marker id on PUT/DELETE; the handlers
    // disambiguate by whether the segment parses as an integer.
    Router::new()
        .route(
            "/markers",
            get(handlers::list_public_markers).post(handlers::create_marker),
        )
        .route(
            "/markers/:key",
            get(handlers::list_user_markers)
                .put(handlers::update_marker)
                .delete(handlers::delete_marker),
        )
        .route("/markers/:key/status", put(handlers::update_marker_status))
}
