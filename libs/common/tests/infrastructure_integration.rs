//! Integration tests for the database infrastructure
//!
//! These tests need a reachable PostgreSQL instance (`DATABASE_URL`) and are
//! ignored by default. Run with `cargo test -p vidtube-common -- --ignored`.

use sqlx::Row;
use vidtube_common::database::{DatabaseConfig, health_check, init_pool, run_migrations};

/// Verifies the pool connects, migrations apply and the schema is queryable
#[tokio::test]
#[ignore]
async fn test_database_infrastructure() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    // Applying twice must be a no-op
    run_migrations(&pool).await?;
    run_migrations(&pool).await?;

    let row = sqlx::query(
        "SELECT COUNT(*) AS tables FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_name IN \
         ('users', 'videos', 'comments', 'likes', 'playlists', 'playlist_videos', \
          'subscriptions', 'tweets', 'watch_history')",
    )
    .fetch_one(&pool)
    .await?;

    let tables: i64 = row.get("tables");
    assert_eq!(tables, 9, "Expected every entity table to exist");

    Ok(())
}

/// A like row must reference exactly one target
#[tokio::test]
#[ignore]
async fn test_like_target_check_constraint() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::from_env()?).await?;
    run_migrations(&pool).await?;

    let user_id: String = sqlx::query_scalar(
        "INSERT INTO users (username, email, full_name, avatar, password_hash) \
         VALUES ('check_user_' || md5(random()::text), md5(random()::text) || '@example.com', \
                 'Check User', 'http://avatar', 'hash') RETURNING id::text",
    )
    .fetch_one(&pool)
    .await?;

    let result = sqlx::query("INSERT INTO likes (liked_by) VALUES ($1::uuid)")
        .bind(&user_id)
        .execute(&pool)
        .await;
    assert!(result.is_err(), "A like without a target must be rejected");

    sqlx::query("DELETE FROM users WHERE id = $1::uuid")
        .bind(&user_id)
        .execute(&pool)
        .await?;

    Ok(())
}
