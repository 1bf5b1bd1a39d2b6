use axum::{extract::State, http::StatusCode, Json};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, ApiResult, AppJson},
    state::AppState,
    users::repo::{Gender, User},
};

use super::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use super::password::{hash_password, verify_password};

/// Identical body for unknown-username and wrong-password so callers cannot
/// enumerate accounts.
const LOGIN_FAILED: &str = "username or password incorrect";

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let username = payload.username.trim();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() || payload.password.is_empty() || email.is_empty() {
        return Err(ApiError::BadRequest(
            "username, password and email are required".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(%email, "register with invalid email");
        return Err(ApiError::BadRequest("invalid email".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    let gender = payload.gender.unwrap_or(Gender::Secret);

    let user = User::create(
        &state.db,
        username,
        &email,
        &hash,
        gender,
        OffsetDateTime::now_utc(),
    )
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return ApiError::Conflict("username or email already exists".into());
            }
        }
        ApiError::from(e)
    })?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            message: "user registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".into(),
        ));
    }

    let user = match User::find_by_username(&state.db, payload.username.trim()).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login for unknown username");
            return Err(ApiError::Unauthorized(LOGIN_FAILED.into()));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !ok {
        warn!(username = %user.username, "login with wrong password");
        return Err(ApiError::Unauthorized(LOGIN_FAILED.into()));
    }

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        message: "login successful".into(),
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn email_regex_rejects_junk() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("missing@tld"));
    }
}
