//! Repositories for entity storage
//!
//! Every entity is reached through an `async_trait` repository so handlers do
//! not care whether records live in Postgres or in the in-process
//! [`MemoryStore`]. [`Repositories`] bundles one implementation of each trait
//! and is built once at startup.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use vidtube_common::{
    error::DatabaseError,
    pagination::{Page, PageRequest},
};

use crate::models::{
    ChannelProfile, ChannelStats, Comment, Like, LikeTarget, NewComment, NewPlaylist, NewTweet,
    NewUser, NewVideo, Playlist, Subscription, Tweet, UpdateUser, UpdateVideo, User, UserSummary,
    Video, VideoFilter, VideoWithOwner,
};

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod memory;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::PgCommentRepository;
pub use dashboard::PgDashboardRepository;
pub use like::PgLikeRepository;
pub use memory::MemoryStore;
pub use playlist::PgPlaylistRepository;
pub use subscription::PgSubscriptionRepository;
pub use tweet::PgTweetRepository;
pub use user::PgUserRepository;
pub use video::PgVideoRepository;

/// Errors raised by the entity store
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness invariant would be broken
    #[error("{0}")]
    Conflict(String),

    /// The backing database failed
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let err = DatabaseError::Query(err);
        if err.is_unique_violation() {
            StoreError::Conflict("Record already exists".to_string())
        } else {
            StoreError::Database(err)
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a toggle operation
#[derive(Debug, Clone, PartialEq)]
pub enum Toggle<T> {
    /// The relation now exists; holds the (possibly pre-existing) record
    Created(T),
    /// The relation was removed
    Removed,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; duplicate username or email is a `Conflict`
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Find a user matching the username or the email, whichever is given
    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>>;

    async fn update(&self, id: Uuid, update: UpdateUser) -> StoreResult<Option<User>>;

    /// Store or clear the refresh token currently valid for the user
    async fn set_refresh_token(&self, id: Uuid, token: Option<String>) -> StoreResult<()>;

    /// Channel page for `username` seen by `viewer_id`
    async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> StoreResult<Option<ChannelProfile>>;

    /// Watched videos, most recent first
    async fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<VideoWithOwner>>;
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, video: NewVideo) -> StoreResult<Video>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Video>>;

    async fn find_with_owner(&self, id: Uuid) -> StoreResult<Option<VideoWithOwner>>;

    async fn list(
        &self,
        filter: &VideoFilter,
        page: PageRequest,
    ) -> StoreResult<Page<VideoWithOwner>>;

    async fn update(&self, id: Uuid, update: UpdateVideo) -> StoreResult<Option<Video>>;

    /// Flip `is_published` atomically
    async fn toggle_publish(&self, id: Uuid) -> StoreResult<Option<Video>>;

    /// Delete a video together with its comments, likes, playlist entries
    /// and history entries
    async fn delete(&self, id: Uuid) -> StoreResult<Option<Video>>;

    /// Count a view and move the video to the front of the viewer's history
    async fn record_view(&self, video_id: Uuid, viewer_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>>;

    /// Comments of a video, newest first
    async fn list_for_video(
        &self,
        video_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Comment>>;

    async fn update_content(&self, id: Uuid, content: String) -> StoreResult<Option<Comment>>;

    /// Delete a comment and the likes on it
    async fn delete(&self, id: Uuid) -> StoreResult<Option<Comment>>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Remove the like if present, otherwise create it. Concurrent creators
    /// converge on a single record.
    async fn toggle(&self, liked_by: Uuid, target: LikeTarget) -> StoreResult<Toggle<Like>>;

    /// Published videos liked by the user, newest like first
    async fn liked_videos(&self, user_id: Uuid) -> StoreResult<Vec<VideoWithOwner>>;
}

#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn create(&self, playlist: NewPlaylist) -> StoreResult<Playlist>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Playlist>>;

    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Playlist>>;

    async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> StoreResult<Option<Playlist>>;

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Playlist>>;

    /// Append a video unless it is already present
    async fn add_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<Option<Playlist>>;

    async fn remove_video(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> StoreResult<Option<Playlist>>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Unsubscribe if subscribed, otherwise subscribe
    async fn toggle(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> StoreResult<Toggle<Subscription>>;

    async fn subscribers(&self, channel_id: Uuid) -> StoreResult<Vec<UserSummary>>;

    async fn subscribed_channels(&self, subscriber_id: Uuid) -> StoreResult<Vec<UserSummary>>;
}

#[async_trait]
pub trait TweetRepository: Send + Sync {
    async fn create(&self, tweet: NewTweet) -> StoreResult<Tweet>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Tweet>>;

    /// Tweets of a user, newest first
    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Tweet>>;

    async fn update_content(&self, id: Uuid, content: String) -> StoreResult<Option<Tweet>>;

    /// Delete a tweet and the likes on it
    async fn delete(&self, id: Uuid) -> StoreResult<Option<Tweet>>;
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn channel_stats(&self, owner_id: Uuid) -> StoreResult<ChannelStats>;

    /// Check that the store answers
    async fn ping(&self) -> StoreResult<()>;
}

/// One implementation of every repository, shared through `AppState`
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub videos: Arc<dyn VideoRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub tweets: Arc<dyn TweetRepository>,
    pub dashboard: Arc<dyn DashboardRepository>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            videos: Arc::new(PgVideoRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            likes: Arc::new(PgLikeRepository::new(pool.clone())),
            playlists: Arc::new(PgPlaylistRepository::new(pool.clone())),
            subscriptions: Arc::new(PgSubscriptionRepository::new(pool.clone())),
            tweets: Arc::new(PgTweetRepository::new(pool.clone())),
            dashboard: Arc::new(PgDashboardRepository::new(pool)),
        }
    }

    /// Repositories backed by a fresh in-process store
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            videos: store.clone(),
            comments: store.clone(),
            likes: store.clone(),
            playlists: store.clone(),
            subscriptions: store.clone(),
            tweets: store.clone(),
            dashboard: store,
        }
    }
}
