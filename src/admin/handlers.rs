use axum::{
    extract::{Path, State},
    Json,
};
use time::{OffsetDateTime, Time};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AdminUser,
    error::{ApiError, ApiResult, AppJson},
    markers::dto::DeleteMarkerResponse,
    markers::repo::{Marker, MarkerChanges, MarkerWithUser},
    state::AppState,
    users::dto::MessageResponse,
    users::repo::{Role, User},
};

use super::dto::{AdminUpdateMarkerRequest, AdminUpdateUserRequest, StatsResponse};

#[instrument(skip(state, _admin))]
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<StatsResponse>> {
    let now = OffsetDateTime::now_utc();
    let today_start = now.replace_time(Time::MIDNIGHT);

    let total_markers =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM markers")
            .fetch_one(&state.db)
            .await?;
    let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    let daily_new_markers =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM markers WHERE created_at >= ?")
            .bind(today_start)
            .fetch_one(&state.db)
            .await?;
    let expired_markers =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM markers WHERE expires_at <= ?")
            .bind(now)
            .fetch_one(&state.db)
            .await?;

    Ok(Json(StatsResponse {
        total_markers,
        total_users,
        daily_new_markers,
        expired_markers,
    }))
}

/// Every marker regardless of status, privacy or expiry.
#[instrument(skip(state, _admin))]
pub async fn all_markers(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<MarkerWithUser>>> {
    let markers = Marker::list_all(&state.db).await?;
    Ok(Json(markers))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<User>>> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(users))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_marker(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<AdminUpdateMarkerRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let changes = MarkerChanges {
        title: payload.title,
        description: payload.description,
        contact: payload.contact,
        marker_type: payload.marker_type,
        is_private: None,
        visibility: payload.visibility,
        status: payload.status,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("no valid fields to update".into()));
    }

    let affected =
        Marker::update_fields(&state.db, id, &changes, OffsetDateTime::now_utc()).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("marker not found".into()));
    }

    info!(marker_id = id, admin = %admin.0.username, "marker updated by admin");
    Ok(Json(MessageResponse {
        message: format!("marker {} updated successfully", id),
    }))
}

#[instrument(skip(state, admin))]
pub async fn delete_marker(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteMarkerResponse>> {
    let affected = Marker::delete(&state.db, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("marker not found".into()));
    }

    info!(marker_id = id, admin = %admin.0.username, "marker deleted by admin");
    Ok(Json(DeleteMarkerResponse {
        message: "marker deleted successfully".into(),
        id,
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<AdminUpdateUserRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if payload.name.is_none() && payload.contact.is_none() && payload.role.is_none() {
        return Err(ApiError::BadRequest("no valid fields to update".into()));
    }

    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    // a lone admin demoting themselves would lock the dashboard for good
    if payload.role == Some(Role::User)
        && target.username == admin.0.username
        && User::count_other_admins(&state.db, id).await? == 0
    {
        return Err(ApiError::Forbidden("cannot demote the last admin".into()));
    }

    let affected = User::admin_update(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.contact.as_deref(),
        payload.role,
        OffsetDateTime::now_utc(),
    )
    .await?;
    if affected == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }

    info!(user_id = id, admin = %admin.0.username, "user updated by admin");
    Ok(Json(MessageResponse {
        message: format!("user {} updated successfully", id),
    }))
}

/// Deleting a user also removes all markers they own.
#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    if target.username == admin.0.username {
        return Err(ApiError::Forbidden("admin cannot delete themselves".into()));
    }

    User::delete_with_markers(&state.db, id).await?;
    info!(user_id = id, username = %target.username, admin = %admin.0.username, "user and markers deleted by admin");
    Ok(Json(MessageResponse {
        message: format!("user {} and their markers deleted successfully", id),
    }))
}
