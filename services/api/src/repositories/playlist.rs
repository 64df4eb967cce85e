//! Playlist repository for Postgres

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{PlaylistRepository, StoreResult};
use crate::models::{NewPlaylist, Playlist};

/// Playlist columns aliased `p`, with the member ids in insertion order
const PLAYLIST_COLUMNS: &str = r#"
    p.id, p.name, p.description, p.owner_id, p.created_at, p.updated_at,
    ARRAY(
        SELECT pv.video_id FROM playlist_videos pv
        WHERE pv.playlist_id = p.id
        ORDER BY pv.added_at
    ) AS videos
"#;

fn playlist_from_row(row: &PgRow) -> Playlist {
    Playlist {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        owner_id: row.get("owner_id"),
        videos: row.get("videos"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Playlist repository for database operations
#[derive(Clone)]
pub struct PgPlaylistRepository {
    pool: PgPool,
}

impl PgPlaylistRepository {
    /// Create a new playlist repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn touch(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE playlists SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PlaylistRepository for PgPlaylistRepository {
    async fn create(&self, playlist: NewPlaylist) -> StoreResult<Playlist> {
        let row = sqlx::query(
            r#"
            INSERT INTO playlists (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at, updated_at,
                      ARRAY[]::UUID[] AS videos
            "#,
        )
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(playlist_from_row(&row))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        let sql = format!("SELECT {PLAYLIST_COLUMNS} FROM playlists p WHERE p.id = $1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(playlist_from_row))
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Playlist>> {
        let sql = format!(
            r#"
            SELECT {PLAYLIST_COLUMNS}
            FROM playlists p
            WHERE p.owner_id = $1
            ORDER BY p.created_at DESC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(playlist_from_row).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> StoreResult<Option<Playlist>> {
        let updated = sqlx::query(
            r#"
            UPDATE playlists
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        let Some(playlist) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Some(playlist))
    }

    async fn add_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<Option<Playlist>> {
        sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id)
            VALUES ($1, $2)
            ON CONFLICT (playlist_id, video_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        self.touch(playlist_id).await?;
        self.find_by_id(playlist_id).await
    }

    async fn remove_video(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> StoreResult<Option<Playlist>> {
        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
            .bind(playlist_id)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        self.touch(playlist_id).await?;
        self.find_by_id(playlist_id).await
    }
}
