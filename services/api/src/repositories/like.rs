//! Like repository for Postgres

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{
    LikeRepository, StoreResult, Toggle,
    video::{VIDEO_WITH_OWNER_COLUMNS, video_with_owner_from_row},
};
use crate::models::{Like, LikeTarget, VideoWithOwner};

const LIKE_COLUMNS: &str = "id, liked_by, video_id, comment_id, tweet_id, created_at";

fn like_from_row(row: &PgRow) -> Like {
    Like {
        id: row.get("id"),
        liked_by: row.get("liked_by"),
        video_id: row.get("video_id"),
        comment_id: row.get("comment_id"),
        tweet_id: row.get("tweet_id"),
        created_at: row.get("created_at"),
    }
}

/// Like repository for database operations
#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    /// Create a new like repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    async fn toggle(&self, liked_by: Uuid, target: LikeTarget) -> StoreResult<Toggle<Like>> {
        let column = target.column();

        let removed = sqlx::query(&format!(
            "DELETE FROM likes WHERE liked_by = $1 AND {column} = $2 RETURNING id"
        ))
        .bind(liked_by)
        .bind(target.id())
        .fetch_optional(&self.pool)
        .await?;

        if removed.is_some() {
            return Ok(Toggle::Removed);
        }

        // The partial unique indexes turn a concurrent duplicate into a no-op
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO likes (liked_by, {column})
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING {LIKE_COLUMNS}
            "#
        ))
        .bind(liked_by)
        .bind(target.id())
        .fetch_optional(&self.pool)
        .await?;

        let row = match inserted {
            Some(row) => Some(row),
            None => {
                sqlx::query(&format!(
                    "SELECT {LIKE_COLUMNS} FROM likes WHERE liked_by = $1 AND {column} = $2"
                ))
                .bind(liked_by)
                .bind(target.id())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(match row {
            Some(row) => Toggle::Created(like_from_row(&row)),
            None => Toggle::Removed,
        })
    }

    async fn liked_videos(&self, user_id: Uuid) -> StoreResult<Vec<VideoWithOwner>> {
        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM likes l
            JOIN videos v ON v.id = l.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE l.liked_by = $1 AND v.is_published
            ORDER BY l.created_at DESC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(video_with_owner_from_row).collect())
    }
}
