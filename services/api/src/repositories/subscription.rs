//! Subscription repository for Postgres

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreResult, SubscriptionRepository, Toggle};
use crate::models::{Subscription, UserSummary};

const SUBSCRIPTION_COLUMNS: &str = "id, subscriber_id, channel_id, created_at";

/// Subscription repository for database operations
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn toggle(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> StoreResult<Toggle<Subscription>> {
        let removed = sqlx::query(
            "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2 RETURNING id",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        if removed.is_some() {
            return Ok(Toggle::Removed);
        }

        let sql = format!(
            r#"
            INSERT INTO subscriptions (subscriber_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT (subscriber_id, channel_id) DO NOTHING
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, Subscription>(&sql)
            .bind(subscriber_id)
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;

        let subscription = match inserted {
            Some(subscription) => Some(subscription),
            None => {
                let sql = format!(
                    "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
                     WHERE subscriber_id = $1 AND channel_id = $2"
                );
                sqlx::query_as::<_, Subscription>(&sql)
                    .bind(subscriber_id)
                    .bind(channel_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        Ok(subscription.map_or(Toggle::Removed, Toggle::Created))
    }

    async fn subscribers(&self, channel_id: Uuid) -> StoreResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.full_name, u.avatar
            FROM subscriptions s
            JOIN users u ON u.id = s.subscriber_id
            WHERE s.channel_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn subscribed_channels(&self, subscriber_id: Uuid) -> StoreResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.full_name, u.avatar
            FROM subscriptions s
            JOIN users u ON u.id = s.channel_id
            WHERE s.subscriber_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
