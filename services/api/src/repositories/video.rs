//! Video repository for Postgres

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;
use vidtube_common::pagination::{Page, PageRequest};

use super::{StoreResult, VideoRepository};
use crate::models::{NewVideo, UpdateVideo, UserSummary, Video, VideoFilter, VideoWithOwner};

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_file, thumbnail, duration, \
                             views, is_published, created_at, updated_at";

/// Video columns aliased `v` joined with owner columns aliased `u`
pub(crate) const VIDEO_WITH_OWNER_COLUMNS: &str = r#"
    v.id, v.owner_id, v.title, v.description, v.video_file, v.thumbnail, v.duration,
    v.views, v.is_published, v.created_at, v.updated_at,
    u.username AS owner_username, u.full_name AS owner_full_name, u.avatar AS owner_avatar
"#;

pub(crate) fn video_with_owner_from_row(row: &PgRow) -> VideoWithOwner {
    let owner_id: Uuid = row.get("owner_id");

    VideoWithOwner {
        video: Video {
            id: row.get("id"),
            owner_id,
            title: row.get("title"),
            description: row.get("description"),
            video_file: row.get("video_file"),
            thumbnail: row.get("thumbnail"),
            duration: row.get("duration"),
            views: row.get("views"),
            is_published: row.get("is_published"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        owner: UserSummary {
            id: owner_id,
            username: row.get("owner_username"),
            full_name: row.get("owner_full_name"),
            avatar: row.get("owner_avatar"),
        },
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &VideoFilter) {
    builder.push(" WHERE TRUE");

    if filter.published_only {
        builder.push(" AND v.is_published");
    }
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND v.owner_id = ").push_bind(owner_id);
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND v.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)))
            .push(r" ESCAPE '\'");
    }
}

/// Video repository for database operations
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    /// Create a new video repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn create(&self, video: NewVideo) -> StoreResult<Video> {
        let sql = format!(
            r#"
            INSERT INTO videos (owner_id, title, description, video_file, thumbnail, duration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(video.owner_id)
            .bind(&video.title)
            .bind(&video.description)
            .bind(&video.video_file)
            .bind(&video.thumbnail)
            .bind(video.duration)
            .fetch_one(&self.pool)
            .await?;

        Ok(video)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Video>> {
        let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");

        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn find_with_owner(&self, id: Uuid) -> StoreResult<Option<VideoWithOwner>> {
        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE v.id = $1
            "#
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(video_with_owner_from_row))
    }

    async fn list(
        &self,
        filter: &VideoFilter,
        page: PageRequest,
    ) -> StoreResult<Page<VideoWithOwner>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM videos v");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS} FROM videos v JOIN users u ON u.id = v.owner_id"
        ));
        push_filter(&mut select, filter);

        // Column and direction come from closed enums, never from input
        let direction = filter.direction.sql();
        select.push(format!(
            " ORDER BY v.{} {direction}, v.id {direction}",
            filter.sort_by.column()
        ));
        select
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = select.build().fetch_all(&self.pool).await?;
        let docs = rows.iter().map(video_with_owner_from_row).collect();

        Ok(Page::new(docs, total.max(0) as u64, page))
    }

    async fn update(&self, id: Uuid, update: UpdateVideo) -> StoreResult<Option<Video>> {
        let sql = format!(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail = COALESCE($4, thumbnail),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .bind(update.title)
            .bind(update.description)
            .bind(update.thumbnail)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn toggle_publish(&self, id: Uuid) -> StoreResult<Option<Video>> {
        let sql = format!(
            r#"
            UPDATE videos
            SET is_published = NOT is_published, updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Video>> {
        // Comments, likes, playlist entries and history rows go with the
        // video through ON DELETE CASCADE
        let sql = format!("DELETE FROM videos WHERE id = $1 RETURNING {VIDEO_COLUMNS}");

        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn record_view(&self, video_id: Uuid, viewer_id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO watch_history (user_id, video_id, watched_at)
            VALUES ($1, $2, clock_timestamp())
            ON CONFLICT (user_id, video_id)
            DO UPDATE SET watched_at = EXCLUDED.watched_at
            "#,
        )
        .bind(viewer_id)
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("cats"), "cats");
        assert_eq!(escape_like("100%_real\\"), "100\\%\\_real\\\\");
    }

    #[test]
    fn test_filter_sql() {
        let filter = VideoFilter {
            search: Some("rust".to_string()),
            owner_id: Some(Uuid::nil()),
            published_only: true,
            ..Default::default()
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM videos v");
        push_filter(&mut builder, &filter);

        assert_eq!(
            builder.sql(),
            r"SELECT COUNT(*) FROM videos v WHERE TRUE AND v.is_published AND v.owner_id = $1 AND v.title ILIKE $2 ESCAPE '\'"
        );
    }
}
