use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Secret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub bio: Option<String>,
    pub gender: Gender,
    pub age: Option<i64>,
    pub role: Role,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Profile fields a user may patch about themselves. `None` leaves the column
/// untouched.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact.is_none()
            && self.bio.is_none()
            && self.gender.is_none()
            && self.age.is_none()
    }
}

impl User {
    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
        gender: Gender,
        now: OffsetDateTime,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, gender, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'user', ?, ?)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(gender)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
    }

    /// Patches only the supplied profile fields and stamps `updated_at`.
    /// Returns the number of affected rows (0 means unknown username).
    pub async fn update_profile(
        db: &SqlitePool,
        username: &str,
        changes: &ProfileChanges,
        now: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                contact = COALESCE(?, contact),
                bio = COALESCE(?, bio),
                gender = COALESCE(?, gender),
                age = COALESCE(?, age),
                updated_at = ?
            WHERE username = ?
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.contact)
        .bind(&changes.bio)
        .bind(changes.gender)
        .bind(changes.age)
        .bind(now)
        .bind(username)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn set_avatar(
        db: &SqlitePool,
        username: &str,
        avatar_url: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE users SET avatar_url = ?, updated_at = ? WHERE username = ?
            "#,
        )
        .bind(avatar_url)
        .bind(now)
        .bind(username)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Admin-side patch: display name, contact and role only. Password and
    /// email changes stay off this path.
    pub async fn admin_update(
        db: &SqlitePool,
        id: i64,
        name: Option<&str>,
        contact: Option<&str>,
        role: Option<Role>,
        now: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                contact = COALESCE(?, contact),
                role = COALESCE(?, role),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(contact)
        .bind(role)
        .bind(now)
        .bind(id)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn count_other_admins(db: &SqlitePool, id: i64) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users WHERE role = 'admin' AND id != ?
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(n)
    }

    /// Removes the user and every marker they own. Two statements, no
    /// transaction: the storage layer gives single-statement atomicity only,
    /// matching the rest of the API.
    pub async fn delete_with_markers(db: &SqlitePool, id: i64) -> anyhow::Result<u64> {
        sqlx::query("DELETE FROM markers WHERE user_id = ?")
            .bind(id)
            .execute(db)
            .await?;
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_user_never_carries_the_hash() {
        let user = User {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            name: None,
            contact: None,
            bio: None,
            gender: Gender::Secret,
            age: None,
            role: Role::User,
            avatar_url: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
        assert_eq!(json["gender"], "secret");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn profile_changes_emptiness() {
        assert!(ProfileChanges::default().is_empty());
        let changes = ProfileChanges {
            age: Some(30),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
