pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:username", get(handlers::get_user_profile))
        .route("/profile", put(handlers::update_profile))
        .route("/avatar", post(handlers::upload_avatar))
        .route("/uploads/avatars/:filename", get(handlers::serve_avatar))
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024))
}
