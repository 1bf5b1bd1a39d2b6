use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{
    error::ApiError,
    state::AppState,
    users::repo::{Role, User},
};

pub const USER_HEADER: &str = "x-user-username";
pub const ADMIN_HEADER: &str = "x-admin-username";

/// Shared-secret header auth: the caller names themselves via
/// `X-User-Username` and the row must exist. There is no signature or session
/// behind the header, so any client can claim any name (see DESIGN.md).
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = header_value(parts, USER_HEADER).ok_or_else(|| {
            ApiError::Unauthorized("authentication required: missing username header".into())
        })?;

        let user = User::find_by_username(&state.db, &username)
            .await?
            .ok_or_else(|| {
                ApiError::Unauthorized("authentication failed: user not found".into())
            })?;

        Ok(AuthUser(user))
    }
}

/// `X-Admin-Username` plus a `role = admin` check against the row. Missing
/// header is 401, a non-admin caller is 403.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = header_value(parts, ADMIN_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("admin username required".into()))?;

        let user = User::find_by_username(&state.db, &username)
            .await?
            .filter(|u| u.role == Role::Admin)
            .ok_or_else(|| ApiError::Forbidden("unauthorized: not an admin".into()))?;

        Ok(AdminUser(user))
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
