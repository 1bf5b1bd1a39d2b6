use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MarkerType {
    Personal,
    Business,
    Official,
    Charity,
}

/// How long a marker stays visible; fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Visibility {
    Today,
    ThreeDays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MarkerStatus {
    Active,
    Inactive,
    Expired,
    Pending,
    Deleted,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Marker {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub marker_type: MarkerType,
    pub contact: Option<String>,
    pub is_private: bool,
    pub visibility: Visibility,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub status: MarkerStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A marker joined with its owner, as returned by the listing endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MarkerWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub marker: Marker,
    pub user_username: String,
    pub user_name: Option<String>,
}

/// A validated marker ready for insertion.
#[derive(Debug)]
pub struct NewMarker {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub marker_type: MarkerType,
    pub contact: Option<String>,
    pub is_private: bool,
    pub visibility: Visibility,
}

/// Patchable marker fields. `None` leaves the column as is. Changing
/// `visibility` never recomputes `expires_at`; expiry is fixed at creation.
#[derive(Debug, Default)]
pub struct MarkerChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub marker_type: Option<MarkerType>,
    pub is_private: Option<bool>,
    pub visibility: Option<Visibility>,
    pub status: Option<MarkerStatus>,
}

impl MarkerChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.contact.is_none()
            && self.marker_type.is_none()
            && self.is_private.is_none()
            && self.visibility.is_none()
            && self.status.is_none()
    }
}

/// Expiry is computed once, from the creation instant: `today` buys 24 hours,
/// `three_days` buys 72.
pub fn expires_after(visibility: Visibility, created_at: OffsetDateTime) -> OffsetDateTime {
    match visibility {
        Visibility::Today => created_at + Duration::days(1),
        Visibility::ThreeDays => created_at + Duration::days(3),
    }
}

impl Marker {
    pub async fn insert(
        db: &SqlitePool,
        new: &NewMarker,
        now: OffsetDateTime,
    ) -> anyhow::Result<Marker> {
        let expires_at = expires_after(new.visibility, now);
        let marker = sqlx::query_as::<_, Marker>(
            r#"
            INSERT INTO markers
                (user_id, title, description, lat, lng, marker_type, contact,
                 is_private, visibility, expires_at, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'active', ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.lat)
        .bind(new.lng)
        .bind(new.marker_type)
        .bind(&new.contact)
        .bind(new.is_private)
        .bind(new.visibility)
        .bind(expires_at)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await?;
        Ok(marker)
    }

    /// Public listing: every non-private marker, joined with its owner.
    pub async fn list_public(db: &SqlitePool) -> anyhow::Result<Vec<MarkerWithUser>> {
        let rows = sqlx::query_as::<_, MarkerWithUser>(
            r#"
            SELECT m.*, u.username AS user_username, u.name AS user_name
            FROM markers m
            JOIN users u ON m.user_id = u.id
            WHERE m.is_private = 0
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Everything a user owns, private markers included ("my markers" view).
    pub async fn list_for_username(
        db: &SqlitePool,
        username: &str,
    ) -> anyhow::Result<Vec<MarkerWithUser>> {
        let rows = sqlx::query_as::<_, MarkerWithUser>(
            r#"
            SELECT m.*, u.username AS user_username, u.name AS user_name
            FROM markers m
            JOIN users u ON m.user_id = u.id
            WHERE u.username = ?
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(username)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<MarkerWithUser>> {
        let rows = sqlx::query_as::<_, MarkerWithUser>(
            r#"
            SELECT m.*, u.username AS user_username, u.name AS user_name
            FROM markers m
            JOIN users u ON m.user_id = u.id
            ORDER BY m.created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Marker>> {
        let marker = sqlx::query_as::<_, Marker>(
            r#"
            SELECT * FROM markers WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(marker)
    }

    pub async fn count_active_for_user(db: &SqlitePool, user_id: i64) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM markers WHERE user_id = ? AND status = 'active'
            "#,
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(n)
    }

    pub async fn update_fields(
        db: &SqlitePool,
        id: i64,
        changes: &MarkerChanges,
        now: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE markers SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                contact = COALESCE(?, contact),
                marker_type = COALESCE(?, marker_type),
                is_private = COALESCE(?, is_private),
                visibility = COALESCE(?, visibility),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.contact)
        .bind(changes.marker_type)
        .bind(changes.is_private)
        .bind(changes.visibility)
        .bind(changes.status)
        .bind(now)
        .bind(id)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn update_status(
        db: &SqlitePool,
        id: i64,
        status: MarkerStatus,
        now: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE markers SET status = ?, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM markers WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    /// Lazy expiry sweep: flips `active` markers past their `expires_at` to
    /// `expired`. Runs ahead of the public listing; there is no scheduled job.
    pub async fn sweep_expired(db: &SqlitePool, now: OffsetDateTime) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE markers SET status = 'expired', updated_at = ?
            WHERE status = 'active' AND expires_at <= ?
            "#,
        )
        .bind(now)
        .bind(now)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn today_expires_24h_after_creation() {
        let created = datetime!(2025-06-18 10:30:00 UTC);
        assert_eq!(
            expires_after(Visibility::Today, created),
            datetime!(2025-06-19 10:30:00 UTC)
        );
    }

    #[test]
    fn three_days_expires_72h_after_creation() {
        let created = datetime!(2025-06-18 10:30:00 UTC);
        assert_eq!(
            expires_after(Visibility::ThreeDays, created),
            datetime!(2025-06-21 10:30:00 UTC)
        );
    }

    #[test]
    fn enum_wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_value(Visibility::ThreeDays).unwrap(),
            "three_days"
        );
        assert_eq!(serde_json::to_value(MarkerType::Personal).unwrap(), "personal");
        assert_eq!(serde_json::to_value(MarkerStatus::Active).unwrap(), "active");
        assert!(serde_json::from_value::<MarkerStatus>(serde_json::json!("archived")).is_err());
    }

    #[test]
    fn marker_changes_emptiness() {
        assert!(MarkerChanges::default().is_empty());
        let changes = MarkerChanges {
            status: Some(MarkerStatus::Inactive),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
