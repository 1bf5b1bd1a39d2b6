use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::{Gender, User};

/// What `GET /users/:username` exposes: no email, no hash.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub gender: Gender,
    pub age: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            avatar_url: u.avatar_url,
            bio: u.bio,
            gender: u.gender,
            age: u.age,
            created_at: u.created_at,
        }
    }
}

/// Body of `PUT /profile`. `username` names the row; everything else is an
/// optional patch, at least one of which must be present.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub message: String,
    pub avatar_url: String,
}
