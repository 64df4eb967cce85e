//! Video model, listing filters and sort keys

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserSummary;

/// Video entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    /// Length in seconds
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Unpublished videos are only visible to their owner
    pub fn is_visible_to(&self, viewer_id: Uuid) -> bool {
        self.is_published || self.owner_id == viewer_id
    }
}

/// New video creation payload
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
}

/// Video update payload, `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

/// Video joined with its owner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner: UserSummary,
}

/// Sortable video columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortField {
    /// Parse the `sortBy` query value, unknown keys fall back to creation time
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("views") => Self::Views,
            Some("duration") => Self::Duration,
            Some("title") => Self::Title,
            _ => Self::CreatedAt,
        }
    }

    /// Column name in the videos table
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Views => "views",
            Self::Duration => "duration",
            Self::Title => "title",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse the `sortType` query value (`asc`/`desc` or `1`/`-1`)
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") | Some("1") | Some("ascending") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter and ordering for video listings
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// Case-insensitive title substring
    pub search: Option<String>,
    pub owner_id: Option<Uuid>,
    pub published_only: bool,
    pub sort_by: VideoSortField,
    pub direction: SortDirection,
}

/// Query parameters for video listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
    /// Search term matched against titles
    pub query: Option<String>,
    /// Sort field
    pub sort_by: Option<String>,
    /// Sort order (asc or desc)
    pub sort_type: Option<String>,
    /// Restrict to one channel
    pub user_id: Option<String>,
}

impl VideoListQuery {
    /// Build the store filter; the owner is resolved by the caller
    pub fn filter(&self, owner_id: Option<Uuid>, published_only: bool) -> VideoFilter {
        VideoFilter {
            search: self
                .query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            owner_id,
            published_only,
            sort_by: VideoSortField::parse(self.sort_by.as_deref()),
            direction: SortDirection::parse(self.sort_type.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        assert_eq!(VideoSortField::parse(Some("views")), VideoSortField::Views);
        assert_eq!(VideoSortField::parse(Some("bogus")), VideoSortField::CreatedAt);
        assert_eq!(VideoSortField::parse(None), VideoSortField::CreatedAt);

        assert_eq!(SortDirection::parse(Some("1")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("-1")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }

    #[test]
    fn test_unpublished_video_visibility() {
        let owner_id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let mut video = Video {
            id: Uuid::new_v4(),
            owner_id,
            title: "Draft".to_string(),
            description: "Not ready".to_string(),
            video_file: "http://media/v.mp4".to_string(),
            thumbnail: "http://media/t.png".to_string(),
            duration: 3.0,
            views: 0,
            is_published: false,
            created_at: now,
            updated_at: now,
        };

        assert!(video.is_visible_to(owner_id));
        assert!(!video.is_visible_to(Uuid::new_v4()));

        video.is_published = true;
        assert!(video.is_visible_to(Uuid::new_v4()));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = VideoListQuery {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter(None, true).search, None);
    }
}
