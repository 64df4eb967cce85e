//! Like model
//!
//! A like points at exactly one target. The wire shape keeps the three
//! optional id fields so clients can tell what was liked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Thing a like points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => *id,
        }
    }

    /// Column holding the target id in the likes table
    pub fn column(&self) -> &'static str {
        match self {
            Self::Video(_) => "video_id",
            Self::Comment(_) => "comment_id",
            Self::Tweet(_) => "tweet_id",
        }
    }

    /// Human readable kind, used in not-found messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Video(_) => "Video",
            Self::Comment(_) => "Comment",
            Self::Tweet(_) => "Tweet",
        }
    }
}

/// Like record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub liked_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn target(&self) -> Option<LikeTarget> {
        match (self.video_id, self.comment_id, self.tweet_id) {
            (Some(id), None, None) => Some(LikeTarget::Video(id)),
            (None, Some(id), None) => Some(LikeTarget::Comment(id)),
            (None, None, Some(id)) => Some(LikeTarget::Tweet(id)),
            _ => None,
        }
    }
}

/// Result of a like toggle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub is_liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<Like>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_round_trips_through_like() {
        let id = Uuid::new_v4();
        let like = Like {
            id: Uuid::new_v4(),
            liked_by: Uuid::new_v4(),
            video_id: None,
            comment_id: Some(id),
            tweet_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(like.target(), Some(LikeTarget::Comment(id)));
        assert_eq!(LikeTarget::Comment(id).column(), "comment_id");
    }

    #[test]
    fn test_status_omits_absent_like() {
        let status = LikeStatus {
            is_liked: false,
            like: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({ "isLiked": false }));
    }
}
