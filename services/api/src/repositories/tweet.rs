//! Tweet repository for Postgres

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreResult, TweetRepository};
use crate::models::{NewTweet, Tweet};

const TWEET_COLUMNS: &str = "id, content, owner_id, created_at, updated_at";

/// Tweet repository for database operations
#[derive(Clone)]
pub struct PgTweetRepository {
    pool: PgPool,
}

impl PgTweetRepository {
    /// Create a new tweet repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TweetRepository for PgTweetRepository {
    async fn create(&self, tweet: NewTweet) -> StoreResult<Tweet> {
        let sql = format!(
            "INSERT INTO tweets (content, owner_id) VALUES ($1, $2) RETURNING {TWEET_COLUMNS}"
        );

        let tweet = sqlx::query_as::<_, Tweet>(&sql)
            .bind(&tweet.content)
            .bind(tweet.owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(tweet)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Tweet>> {
        let sql = format!("SELECT {TWEET_COLUMNS} FROM tweets WHERE id = $1");

        let tweet = sqlx::query_as::<_, Tweet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tweet)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Tweet>> {
        let sql = format!(
            r#"
            SELECT {TWEET_COLUMNS}
            FROM tweets
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        );

        let tweets = sqlx::query_as::<_, Tweet>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tweets)
    }

    async fn update_content(&self, id: Uuid, content: String) -> StoreResult<Option<Tweet>> {
        let sql = format!(
            r#"
            UPDATE tweets
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TWEET_COLUMNS}
            "#
        );

        let tweet = sqlx::query_as::<_, Tweet>(&sql)
            .bind(id)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tweet)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Tweet>> {
        let sql = format!("DELETE FROM tweets WHERE id = $1 RETURNING {TWEET_COLUMNS}");

        let tweet = sqlx::query_as::<_, Tweet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tweet)
    }
}
