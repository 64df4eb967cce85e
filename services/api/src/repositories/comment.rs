//! Comment repository for Postgres

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use vidtube_common::pagination::{Page, PageRequest};

use super::{CommentRepository, StoreResult};
use crate::models::{Comment, NewComment};

const COMMENT_COLUMNS: &str = "id, content, video_id, owner_id, created_at, updated_at";

/// Comment repository for database operations
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    /// Create a new comment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment> {
        let sql = format!(
            r#"
            INSERT INTO comments (content, video_id, owner_id)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(&comment.content)
            .bind(comment.video_id)
            .bind(comment.owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    async fn list_for_video(
        &self,
        video_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Comment>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE video_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(video_id)
            .bind(i64::from(page.limit()))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(comments, total.max(0) as u64, page))
    }

    async fn update_content(&self, id: Uuid, content: String) -> StoreResult<Option<Comment>> {
        let sql = format!(
            r#"
            UPDATE comments
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let sql = format!("DELETE FROM comments WHERE id = $1 RETURNING {COMMENT_COLUMNS}");

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }
}
