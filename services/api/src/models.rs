//! API models for entities, request payloads and response projections

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::{Comment, NewComment};
pub use dashboard::ChannelStats;
pub use like::{Like, LikeStatus, LikeTarget};
pub use playlist::{NewPlaylist, Playlist, PlaylistRequest};
pub use subscription::{Subscription, SubscriptionStatus};
pub use tweet::{NewTweet, Tweet};
pub use user::{
    ChangePasswordRequest, ChannelProfile, LoginRequest, LoginResponse, NewUser, PublicUser,
    RefreshTokenRequest, TokenResponse, UpdateAccountRequest, UpdateUser, User, UserSummary,
};
pub use video::{
    NewVideo, SortDirection, UpdateVideo, Video, VideoFilter, VideoListQuery, VideoSortField,
    VideoWithOwner,
};

use serde::Deserialize;

/// Pagination query parameters shared by simple listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

/// Body carrying a single text `content` field (comments, tweets)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentRequest {
    pub content: Option<String>,
}
