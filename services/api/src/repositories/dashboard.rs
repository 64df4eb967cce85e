//! Channel dashboard queries for Postgres

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;
use vidtube_common::database::health_check;

use super::{DashboardRepository, StoreError, StoreResult};
use crate::models::ChannelStats;

/// Dashboard repository for database operations
#[derive(Clone)]
pub struct PgDashboardRepository {
    pool: PgPool,
}

impl PgDashboardRepository {
    /// Create a new dashboard repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DashboardRepository for PgDashboardRepository {
    async fn channel_stats(&self, owner_id: Uuid) -> StoreResult<ChannelStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM videos WHERE owner_id = $1) AS total_videos,
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM videos WHERE owner_id = $1)
                    AS total_views,
                (SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1) AS total_subscribers,
                (SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.video_id
                    WHERE v.owner_id = $1) AS total_likes
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChannelStats {
            total_videos: row.get("total_videos"),
            total_views: row.get("total_views"),
            total_subscribers: row.get("total_subscribers"),
            total_likes: row.get("total_likes"),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(StoreError::from)?;
        Ok(())
    }
}
