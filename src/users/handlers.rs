use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
    Json,
};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult, AppJson},
    state::AppState,
};

use super::dto::{AvatarResponse, MessageResponse, PublicProfile, UpdateProfileRequest};
use super::repo::{ProfileChanges, User};

const ALLOWED_AVATAR_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/gif"];

/// Presigned avatar links expire after ten minutes.
const AVATAR_URL_TTL_SECS: u64 = 600;

#[instrument(skip(state))]
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<PublicProfile>> {
    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, requester, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(requester): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "username is required to update profile".into(),
        ));
    }

    let changes = ProfileChanges {
        name: payload.name,
        contact: payload.contact,
        bio: payload.bio,
        gender: payload.gender,
        age: payload.age,
    };
    if changes.is_empty() {
        warn!(username = %payload.username, "profile update with no fields");
        return Err(ApiError::BadRequest("no fields to update".into()));
    }

    let affected =
        User::update_profile(&state.db, &payload.username, &changes, OffsetDateTime::now_utc())
            .await?;
    if affected == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }

    info!(username = %payload.username, by = %requester.username, "profile updated");
    Ok(Json(MessageResponse {
        message: "profile updated successfully".into(),
    }))
}

/// Multipart field `avatar`. The bytes go to object storage under
/// `avatars/{username}_{timestamp}.jpg`; the user row keeps the public path
/// and the previous object is deleted best-effort.
#[instrument(skip(state, user, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<AvatarResponse>> {
    let mut upload: Option<(bytes::Bytes, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("avatar") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            upload = Some((data, content_type));
            break;
        }
    }

    let Some((data, content_type)) = upload else {
        return Err(ApiError::BadRequest("no avatar file in request".into()));
    };
    if data.is_empty() {
        return Err(ApiError::BadRequest("no file selected".into()));
    }
    if !ALLOWED_AVATAR_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::BadRequest("file type not allowed".into()));
    }

    let now = OffsetDateTime::now_utc();
    let stamp = now
        .format(format_description!(
            "[year][month][day][hour][minute][second]"
        ))
        .map_err(|e| ApiError::Internal(e.into()))?;
    let filename = format!("{}_{}.jpg", user.username, stamp);
    let key = format!("avatars/{}", filename);
    let avatar_url = format!("/uploads/avatars/{}", filename);

    state
        .storage
        .put_object(&key, data, &content_type)
        .await
        .map_err(ApiError::Internal)?;

    User::set_avatar(&state.db, &user.username, &avatar_url, now).await?;

    // drop the superseded object; a stale file is not worth failing the request
    if let Some(old) = user.avatar_url.as_deref() {
        if let Some(old_key) = old.strip_prefix("/uploads/") {
            if let Err(e) = state.storage.delete_object(old_key).await {
                warn!(error = %e, key = old_key, "failed to delete old avatar");
            }
        }
    }

    info!(username = %user.username, %avatar_url, "avatar updated");
    Ok(Json(AvatarResponse {
        message: "avatar updated successfully".into(),
        avatar_url,
    }))
}

/// Serves stored avatars with a 302 to a presigned object URL.
#[instrument(skip(state))]
pub async fn serve_avatar(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Redirect> {
    let avatar_url = format!("/uploads/avatars/{}", filename);
    let known = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users WHERE avatar_url = ?
        "#,
    )
    .bind(&avatar_url)
    .fetch_one(&state.db)
    .await?;
    if known == 0 {
        return Err(ApiError::NotFound("avatar not found".into()));
    }

    let key = format!("avatars/{}", filename);
    let url = state
        .storage
        .presign_get(&key, AVATAR_URL_TTL_SECS)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Redirect::temporary(&url))
}
