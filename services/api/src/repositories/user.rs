//! User repository for Postgres

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{
    StoreError, StoreResult, UserRepository,
    video::{VIDEO_WITH_OWNER_COLUMNS, video_with_owner_from_row},
};
use crate::models::{ChannelProfile, NewUser, UpdateUser, User, VideoWithOwner};

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, password_hash, \
                            refresh_token, created_at, updated_at";

/// User repository for database operations
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.avatar)
            .bind(&user.cover_image)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match StoreError::from(err) {
                StoreError::Conflict(_) => StoreError::Conflict(
                    "User with email or username already exists".to_string(),
                ),
                other => other,
            })
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = $2
            ORDER BY created_at
            LIMIT 1
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update(&self, id: Uuid, update: UpdateUser) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                avatar = COALESCE($4, avatar),
                cover_image = COALESCE($5, cover_image),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.full_name)
            .bind(update.email)
            .bind(update.avatar)
            .bind(update.cover_image)
            .bind(update.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| match StoreError::from(err) {
                StoreError::Conflict(_) => {
                    StoreError::Conflict("Email is already in use".to_string())
                }
                other => other,
            })?;

        Ok(user)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<String>) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> StoreResult<Option<ChannelProfile>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.full_name, u.avatar, u.cover_image, u.created_at,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                       AS subscribers_count,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                       AS channels_subscribed_to_count,
                   EXISTS (
                       SELECT 1 FROM subscriptions s
                       WHERE s.channel_id = u.id AND s.subscriber_id = $2
                   ) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ChannelProfile {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            avatar: row.get("avatar"),
            cover_image: row.get("cover_image"),
            subscribers_count: row.get("subscribers_count"),
            channels_subscribed_to_count: row.get("channels_subscribed_to_count"),
            is_subscribed: row.get("is_subscribed"),
            created_at: row.get("created_at"),
        }))
    }

    async fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<VideoWithOwner>> {
        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM watch_history h
            JOIN videos v ON v.id = h.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE h.user_id = $1
            ORDER BY h.watched_at DESC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(video_with_owner_from_row).collect())
    }
}
