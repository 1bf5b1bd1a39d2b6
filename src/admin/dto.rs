use serde::{Deserialize, Serialize};

use crate::markers::repo::{MarkerStatus, MarkerType, Visibility};
use crate::users::repo::Role;

/// Dashboard counters for `GET /admin/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_markers: i64,
    pub total_users: i64,
    pub daily_new_markers: i64,
    pub expired_markers: i64,
}

/// Admin-side marker patch; unlike the owner path it may rewrite
/// `visibility`, though expiry stays as computed at creation.
#[derive(Debug, Deserialize)]
pub struct AdminUpdateMarkerRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub marker_type: Option<MarkerType>,
    pub visibility: Option<Visibility>,
    pub status: Option<MarkerStatus>,
}

/// Admin-side user patch. Password and email changes are deliberately not
/// possible through this endpoint.
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub role: Option<Role>,
}
