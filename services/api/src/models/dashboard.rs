//! Channel dashboard projections

use serde::Serialize;

/// Aggregate numbers for a channel owner
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    /// Likes on the channel's videos
    pub total_likes: i64,
}
