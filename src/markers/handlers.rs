use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult, AppJson},
    state::AppState,
    users::repo::{Role, User},
};

use super::dto::{
    CreateMarkerRequest, DeleteMarkerResponse, MarkerResponse, UpdateMarkerRequest,
    UpdateStatusRequest,
};
use super::repo::{Marker, MarkerChanges, MarkerWithUser};

/// `GET /markers`: public listing. Runs the lazy expiry sweep first, then
/// returns every non-private marker joined with its owner.
#[instrument(skip(state))]
pub async fn list_public_markers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<MarkerWithUser>>> {
    let now = OffsetDateTime::now_utc();
    let swept = Marker::sweep_expired(&state.db, now).await?;
    if swept > 0 {
        info!(count = swept, "markers expired by sweep");
    }

    let markers = Marker::list_public(&state.db).await?;
    Ok(Json(markers))
}

#[instrument(skip(state, payload))]
pub async fn create_marker(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateMarkerRequest>,
) -> ApiResult<(StatusCode, Json<MarkerResponse>)> {
    let new = payload.validate()?;

    let owner = User::find_by_id(&state.db, new.user_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("user_id does not match an existing user".into()))?;

    let active = Marker::count_active_for_user(&state.db, new.user_id).await?;
    let cap = state.config.max_active_markers;
    if active >= cap {
        warn!(user_id = new.user_id, active, "active marker cap reached");
        return Err(ApiError::Forbidden(format!(
            "you have reached the maximum limit of {} active markers",
            cap
        )));
    }

    let marker = Marker::insert(&state.db, &new, OffsetDateTime::now_utc()).await?;
    info!(marker_id = marker.id, owner = %owner.username, "marker created");
    Ok((
        StatusCode::CREATED,
        Json(MarkerResponse {
            message: "marker created successfully".into(),
            marker,
        }),
    ))
}

/// `GET /markers/:key`: a user's own markers, private ones included. A
/// numeric segment is a marker id, not a username, and there is no
/// marker-by-id read; it answers 404 before any lookup.
#[instrument(skip(state, requester))]
pub async fn list_user_markers(
    State(state): State<AppState>,
    AuthUser(requester): AuthUser,
    Path(key): Path<String>,
) -> ApiResult<Json<Vec<MarkerWithUser>>> {
    if key.parse::<i64>().is_ok() {
        return Err(ApiError::NotFound("not found".into()));
    }
    if requester.username != key && requester.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "you can only view your own markers".into(),
        ));
    }

    let markers = Marker::list_for_username(&state.db, &key).await?;
    Ok(Json(markers))
}

#[instrument(skip(state, payload))]
pub async fn update_marker(
    State(state): State<AppState>,
    Path(key): Path<String>,
    AppJson(payload): AppJson<UpdateMarkerRequest>,
) -> ApiResult<Json<MarkerResponse>> {
    let id = parse_marker_id(&key)?;

    let changes = MarkerChanges {
        title: payload.title,
        description: payload.description,
        contact: payload.contact,
        marker_type: payload.marker_type,
        is_private: payload.is_private,
        visibility: None,
        status: payload.status,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".into()));
    }

    let affected =
        Marker::update_fields(&state.db, id, &changes, OffsetDateTime::now_utc()).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("marker not found".into()));
    }

    let marker = Marker::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("marker not found".into()))?;
    Ok(Json(MarkerResponse {
        message: "marker updated successfully".into(),
        marker,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_marker_status(
    State(state): State<AppState>,
    Path(key): Path<String>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> ApiResult<Json<MarkerResponse>> {
    let id = parse_marker_id(&key)?;

    let affected =
        Marker::update_status(&state.db, id, payload.status, OffsetDateTime::now_utc()).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("marker not found".into()));
    }

    let marker = Marker::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("marker not found".into()))?;
    info!(marker_id = id, status = ?marker.status, "marker status updated");
    Ok(Json(MarkerResponse {
        message: "status updated successfully".into(),
        marker,
    }))
}

#[instrument(skip(state))]
pub async fn delete_marker(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<DeleteMarkerResponse>> {
    let id = parse_marker_id(&key)?;

    let affected = Marker::delete(&state.db, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("marker not found".into()));
    }

    info!(marker_id = id, "marker deleted");
    Ok(Json(DeleteMarkerResponse {
        message: "marker deleted successfully".into(),
        id,
    }))
}

fn parse_marker_id(key: &str) -> Result<i64, ApiError> {
    key.parse::<i64>()
        .map_err(|_| ApiError::NotFound("marker not found".into()))
}
