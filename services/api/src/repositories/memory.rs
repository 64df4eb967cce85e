//! In-process entity store
//!
//! Implements every repository trait over plain vectors guarded by a single
//! `RwLock`. Each operation runs under one lock acquisition, which gives the
//! same uniqueness and toggle guarantees the Postgres constraints give.
//! Selected with `STORE_BACKEND=memory` and used by the test suite.

use async_trait::async_trait;
use chrono::Utc;
use std::{cmp::Ordering, collections::HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;
use vidtube_common::pagination::{Page, PageRequest};

use super::{
    CommentRepository, DashboardRepository, LikeRepository, PlaylistRepository, StoreError,
    StoreResult, SubscriptionRepository, Toggle, TweetRepository, UserRepository,
    VideoRepository,
};
use crate::models::{
    ChannelProfile, ChannelStats, Comment, Like, LikeTarget, NewComment, NewPlaylist, NewTweet,
    NewUser, NewVideo, Playlist, SortDirection, Subscription, Tweet, UpdateUser, UpdateVideo,
    User, UserSummary, Video, VideoFilter, VideoSortField, VideoWithOwner,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    videos: Vec<Video>,
    comments: Vec<Comment>,
    tweets: Vec<Tweet>,
    likes: Vec<Like>,
    playlists: Vec<Playlist>,
    subscriptions: Vec<Subscription>,
    /// Per user, watched video ids with the most recent first
    history: HashMap<Uuid, Vec<Uuid>>,
}

impl State {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn video(&self, id: Uuid) -> Option<&Video> {
        self.videos.iter().find(|v| v.id == id)
    }

    fn with_owner(&self, video: &Video) -> Option<VideoWithOwner> {
        self.user(video.owner_id).map(|owner| VideoWithOwner {
            video: video.clone(),
            owner: UserSummary::from(owner),
        })
    }

    fn summaries(&self, ids: impl Iterator<Item = Uuid>) -> Vec<UserSummary> {
        ids.filter_map(|id| self.user(id).map(UserSummary::from))
            .collect()
    }

    fn remove_likes(&mut self, target: LikeTarget) {
        self.likes.retain(|like| like.target() != Some(target));
    }
}

fn compare_videos(a: &Video, b: &Video, field: VideoSortField) -> Ordering {
    match field {
        VideoSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        VideoSortField::Views => a.views.cmp(&b.views),
        VideoSortField::Duration => a.duration.total_cmp(&b.duration),
        VideoSortField::Title => a.title.cmp(&b.title),
    }
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let docs = items
        .iter()
        .skip(offset)
        .take(page.limit() as usize)
        .cloned()
        .collect();
    Page::new(docs, items.len() as u64, page)
}

/// Entity store kept in process memory
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            password_hash: user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.user(id).cloned())
    }

    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| {
                username.is_some_and(|name| u.username == name)
                    || email.is_some_and(|email| u.email == email)
            })
            .cloned())
    }

    async fn update(&self, id: Uuid, update: UpdateUser) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;

        if let Some(email) = &update.email {
            if state.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict("Email is already in use".to_string()));
            }
        }

        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(avatar) = update.avatar {
            user.avatar = avatar;
        }
        if let Some(cover_image) = update.cover_image {
            user.cover_image = Some(cover_image);
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<String>) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.refresh_token = token;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> StoreResult<Option<ChannelProfile>> {
        let state = self.state.read().await;
        let Some(user) = state.users.iter().find(|u| u.username == username) else {
            return Ok(None);
        };

        let subscribers = state
            .subscriptions
            .iter()
            .filter(|s| s.channel_id == user.id);

        Ok(Some(ChannelProfile {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            subscribers_count: subscribers.clone().count() as i64,
            channels_subscribed_to_count: state
                .subscriptions
                .iter()
                .filter(|s| s.subscriber_id == user.id)
                .count() as i64,
            is_subscribed: subscribers.clone().any(|s| s.subscriber_id == viewer_id),
            created_at: user.created_at,
        }))
    }

    async fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<VideoWithOwner>> {
        let state = self.state.read().await;
        let Some(watched) = state.history.get(&user_id) else {
            return Ok(Vec::new());
        };

        Ok(watched
            .iter()
            .filter_map(|id| state.video(*id))
            .filter_map(|video| state.with_owner(video))
            .collect())
    }
}

#[async_trait]
impl VideoRepository for MemoryStore {
    async fn create(&self, video: NewVideo) -> StoreResult<Video> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            owner_id: video.owner_id,
            title: video.title,
            description: video.description,
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            duration: video.duration,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.videos.push(video.clone());
        Ok(video)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Video>> {
        Ok(self.state.read().await.video(id).cloned())
    }

    async fn find_with_owner(&self, id: Uuid) -> StoreResult<Option<VideoWithOwner>> {
        let state = self.state.read().await;
        Ok(state.video(id).and_then(|video| state.with_owner(video)))
    }

    async fn list(
        &self,
        filter: &VideoFilter,
        page: PageRequest,
    ) -> StoreResult<Page<VideoWithOwner>> {
        let state = self.state.read().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<&Video> = state
            .videos
            .iter()
            .filter(|v| !filter.published_only || v.is_published)
            .filter(|v| filter.owner_id.is_none_or(|owner| v.owner_id == owner))
            .filter(|v| {
                search
                    .as_deref()
                    .is_none_or(|term| v.title.to_lowercase().contains(term))
            })
            .collect();

        matches.sort_by(|a, b| match filter.direction {
            SortDirection::Asc => compare_videos(a, b, filter.sort_by),
            SortDirection::Desc => compare_videos(b, a, filter.sort_by),
        });

        let joined: Vec<VideoWithOwner> = matches
            .into_iter()
            .filter_map(|video| state.with_owner(video))
            .collect();

        Ok(paginate(&joined, page))
    }

    async fn update(&self, id: Uuid, update: UpdateVideo) -> StoreResult<Option<Video>> {
        let mut state = self.state.write().await;
        let Some(video) = state.videos.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            video.title = title;
        }
        if let Some(description) = update.description {
            video.description = description;
        }
        if let Some(thumbnail) = update.thumbnail {
            video.thumbnail = thumbnail;
        }
        video.updated_at = Utc::now();

        Ok(Some(video.clone()))
    }

    async fn toggle_publish(&self, id: Uuid) -> StoreResult<Option<Video>> {
        let mut state = self.state.write().await;
        Ok(state.videos.iter_mut().find(|v| v.id == id).map(|video| {
            video.is_published = !video.is_published;
            video.updated_at = Utc::now();
            video.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Video>> {
        let mut state = self.state.write().await;
        let Some(index) = state.videos.iter().position(|v| v.id == id) else {
            return Ok(None);
        };
        let video = state.videos.remove(index);

        let comment_ids: Vec<Uuid> = state
            .comments
            .iter()
            .filter(|c| c.video_id == id)
            .map(|c| c.id)
            .collect();
        state.comments.retain(|c| c.video_id != id);
        for comment_id in comment_ids {
            state.remove_likes(LikeTarget::Comment(comment_id));
        }
        state.remove_likes(LikeTarget::Video(id));

        for playlist in &mut state.playlists {
            playlist.videos.retain(|video_id| *video_id != id);
        }
        for watched in state.history.values_mut() {
            watched.retain(|video_id| *video_id != id);
        }

        Ok(Some(video))
    }

    async fn record_view(&self, video_id: Uuid, viewer_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let Some(video) = state.videos.iter_mut().find(|v| v.id == video_id) else {
            return Ok(());
        };
        video.views += 1;

        let watched = state.history.entry(viewer_id).or_default();
        watched.retain(|id| *id != video_id);
        watched.insert(0, video_id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: comment.content,
            video_id: comment.video_id,
            owner_id: comment.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_for_video(
        &self,
        video_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Comment>> {
        let state = self.state.read().await;
        let newest_first: Vec<Comment> = state
            .comments
            .iter()
            .rev()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect();
        Ok(paginate(&newest_first, page))
    }

    async fn update_content(&self, id: Uuid, content: String) -> StoreResult<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            comment.content = content;
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let mut state = self.state.write().await;
        let Some(index) = state.comments.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let comment = state.comments.remove(index);
        state.remove_likes(LikeTarget::Comment(id));
        Ok(Some(comment))
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn toggle(&self, liked_by: Uuid, target: LikeTarget) -> StoreResult<Toggle<Like>> {
        let mut state = self.state.write().await;

        if let Some(index) = state
            .likes
            .iter()
            .position(|l| l.liked_by == liked_by && l.target() == Some(target))
        {
            state.likes.remove(index);
            return Ok(Toggle::Removed);
        }

        let (video_id, comment_id, tweet_id) = match target {
            LikeTarget::Video(id) => (Some(id), None, None),
            LikeTarget::Comment(id) => (None, Some(id), None),
            LikeTarget::Tweet(id) => (None, None, Some(id)),
        };
        let like = Like {
            id: Uuid::new_v4(),
            liked_by,
            video_id,
            comment_id,
            tweet_id,
            created_at: Utc::now(),
        };
        state.likes.push(like.clone());
        Ok(Toggle::Created(like))
    }

    async fn liked_videos(&self, user_id: Uuid) -> StoreResult<Vec<VideoWithOwner>> {
        let state = self.state.read().await;
        Ok(state
            .likes
            .iter()
            .rev()
            .filter(|l| l.liked_by == user_id)
            .filter_map(|l| l.video_id)
            .filter_map(|id| state.video(id))
            .filter(|v| v.is_published)
            .filter_map(|v| state.with_owner(v))
            .collect())
    }
}

#[async_trait]
impl PlaylistRepository for MemoryStore {
    async fn create(&self, playlist: NewPlaylist) -> StoreResult<Playlist> {
        let now = Utc::now();
        let playlist = Playlist {
            id: Uuid::new_v4(),
            name: playlist.name,
            description: playlist.description,
            owner_id: playlist.owner_id,
            videos: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        let state = self.state.read().await;
        Ok(state.playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Playlist>> {
        let state = self.state.read().await;
        Ok(state
            .playlists
            .iter()
            .rev()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> StoreResult<Option<Playlist>> {
        let mut state = self.state.write().await;
        Ok(state.playlists.iter_mut().find(|p| p.id == id).map(|playlist| {
            if let Some(name) = name {
                playlist.name = name;
            }
            if let Some(description) = description {
                playlist.description = description;
            }
            playlist.updated_at = Utc::now();
            playlist.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        let mut state = self.state.write().await;
        Ok(state
            .playlists
            .iter()
            .position(|p| p.id == id)
            .map(|index| state.playlists.remove(index)))
    }

    async fn add_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<Option<Playlist>> {
        let mut state = self.state.write().await;
        Ok(state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .map(|playlist| {
                if !playlist.videos.contains(&video_id) {
                    playlist.videos.push(video_id);
                }
                playlist.updated_at = Utc::now();
                playlist.clone()
            }))
    }

    async fn remove_video(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> StoreResult<Option<Playlist>> {
        let mut state = self.state.write().await;
        Ok(state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .map(|playlist| {
                playlist.videos.retain(|id| *id != video_id);
                playlist.updated_at = Utc::now();
                playlist.clone()
            }))
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn toggle(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> StoreResult<Toggle<Subscription>> {
        let mut state = self.state.write().await;

        if let Some(index) = state
            .subscriptions
            .iter()
            .position(|s| s.subscriber_id == subscriber_id && s.channel_id == channel_id)
        {
            state.subscriptions.remove(index);
            return Ok(Toggle::Removed);
        }

        let subscription = Subscription {
            id: Uuid::new_v4(),
            subscriber_id,
            channel_id,
            created_at: Utc::now(),
        };
        state.subscriptions.push(subscription.clone());
        Ok(Toggle::Created(subscription))
    }

    async fn subscribers(&self, channel_id: Uuid) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        let ids = state
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.channel_id == channel_id)
            .map(|s| s.subscriber_id);
        Ok(state.summaries(ids))
    }

    async fn subscribed_channels(&self, subscriber_id: Uuid) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        let ids = state
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.subscriber_id == subscriber_id)
            .map(|s| s.channel_id);
        Ok(state.summaries(ids))
    }
}

#[async_trait]
impl TweetRepository for MemoryStore {
    async fn create(&self, tweet: NewTweet) -> StoreResult<Tweet> {
        let now = Utc::now();
        let tweet = Tweet {
            id: Uuid::new_v4(),
            content: tweet.content,
            owner_id: tweet.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.tweets.push(tweet.clone());
        Ok(tweet)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Tweet>> {
        let state = self.state.read().await;
        Ok(state.tweets.iter().find(|t| t.id == id).cloned())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Tweet>> {
        let state = self.state.read().await;
        Ok(state
            .tweets
            .iter()
            .rev()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_content(&self, id: Uuid, content: String) -> StoreResult<Option<Tweet>> {
        let mut state = self.state.write().await;
        Ok(state.tweets.iter_mut().find(|t| t.id == id).map(|tweet| {
            tweet.content = content;
            tweet.updated_at = Utc::now();
            tweet.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Tweet>> {
        let mut state = self.state.write().await;
        let Some(index) = state.tweets.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let tweet = state.tweets.remove(index);
        state.remove_likes(LikeTarget::Tweet(id));
        Ok(Some(tweet))
    }
}

#[async_trait]
impl DashboardRepository for MemoryStore {
    async fn channel_stats(&self, owner_id: Uuid) -> StoreResult<ChannelStats> {
        let state = self.state.read().await;
        let videos: Vec<&Video> = state
            .videos
            .iter()
            .filter(|v| v.owner_id == owner_id)
            .collect();

        Ok(ChannelStats {
            total_videos: videos.len() as i64,
            total_views: videos.iter().map(|v| v.views).sum(),
            total_subscribers: state
                .subscriptions
                .iter()
                .filter(|s| s.channel_id == owner_id)
                .count() as i64,
            total_likes: state
                .likes
                .iter()
                .filter_map(|l| l.video_id)
                .filter(|id| videos.iter().any(|v| v.id == *id))
                .count() as i64,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            full_name: name.to_uppercase(),
            avatar: format!("http://localhost/media/{}.png", name),
            cover_image: None,
            password_hash: "hash".to_string(),
        }
    }

    fn new_video(owner_id: Uuid, title: &str) -> NewVideo {
        NewVideo {
            owner_id,
            title: title.to_string(),
            description: "description".to_string(),
            video_file: "http://localhost/media/video.mp4".to_string(),
            thumbnail: "http://localhost/media/thumb.png".to_string(),
            duration: 12.5,
        }
    }

    async fn user(store: &MemoryStore, name: &str) -> User {
        UserRepository::create(store, new_user(name)).await.unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "alice").await;

        let mut same_email = new_user("bob");
        same_email.email = "alice@example.com".to_string();
        let result = UserRepository::create(&store, same_email).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let found = store
            .find_by_identity(None, Some("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_like_toggle_twice_restores_state() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let video = VideoRepository::create(&store, new_video(alice.id, "clip"))
            .await
            .unwrap();
        let target = LikeTarget::Video(video.id);

        let first = LikeRepository::toggle(&store, alice.id, target).await.unwrap();
        assert!(matches!(first, Toggle::Created(_)));
        assert_eq!(store.liked_videos(alice.id).await.unwrap().len(), 1);

        let second = LikeRepository::toggle(&store, alice.id, target).await.unwrap();
        assert_eq!(second, Toggle::Removed);
        assert!(store.liked_videos(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_stay_consistent() {
        let store = Arc::new(MemoryStore::new());
        let alice_id = user(&store, "alice").await.id;
        let bob_id = user(&store, "bob").await.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    SubscriptionRepository::toggle(store.as_ref(), alice_id, bob_id).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Eight toggles from the same subscriber cancel out pairwise
        assert!(store.subscribers(bob_id).await.unwrap().is_empty());
        SubscriptionRepository::toggle(store.as_ref(), alice_id, bob_id)
            .await
            .unwrap();
        assert_eq!(store.subscribers(bob_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_video_listing_filters_and_paginates() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        for title in ["Rust intro", "rust async", "Cooking"] {
            VideoRepository::create(&store, new_video(alice.id, title))
                .await
                .unwrap();
        }
        let hidden = VideoRepository::create(&store, new_video(alice.id, "Rust secrets"))
            .await
            .unwrap();
        store.toggle_publish(hidden.id).await.unwrap();

        let filter = VideoFilter {
            search: Some("RUST".to_string()),
            published_only: true,
            sort_by: VideoSortField::Title,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let page = store
            .list(&filter, PageRequest::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.total_docs, 2);
        assert_eq!(page.docs.len(), 1);
        assert_eq!(page.docs[0].video.title, "Rust intro");
        assert_eq!(page.docs[0].owner.username, "alice");

        let beyond = store
            .list(&filter, PageRequest::new(Some(5), Some(10)))
            .await
            .unwrap();
        assert!(beyond.docs.is_empty());
    }

    #[tokio::test]
    async fn test_record_view_moves_video_to_front_of_history() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let first = VideoRepository::create(&store, new_video(alice.id, "first"))
            .await
            .unwrap();
        let second = VideoRepository::create(&store, new_video(alice.id, "second"))
            .await
            .unwrap();

        store.record_view(first.id, alice.id).await.unwrap();
        store.record_view(second.id, alice.id).await.unwrap();
        store.record_view(first.id, alice.id).await.unwrap();

        let history = store.watch_history(alice.id).await.unwrap();
        let ids: Vec<Uuid> = history.iter().map(|v| v.video.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(history[0].video.views, 2);
    }

    #[tokio::test]
    async fn test_deleting_video_cascades() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let video = VideoRepository::create(&store, new_video(alice.id, "clip"))
            .await
            .unwrap();
        let comment = CommentRepository::create(
            &store,
            NewComment {
                content: "nice".to_string(),
                video_id: video.id,
                owner_id: alice.id,
            },
        )
        .await
        .unwrap();
        LikeRepository::toggle(&store, alice.id, LikeTarget::Comment(comment.id))
            .await
            .unwrap();
        LikeRepository::toggle(&store, alice.id, LikeTarget::Video(video.id))
            .await
            .unwrap();
        let playlist = PlaylistRepository::create(
            &store,
            NewPlaylist {
                name: "faves".to_string(),
                description: String::new(),
                owner_id: alice.id,
            },
        )
        .await
        .unwrap();
        store.add_video(playlist.id, video.id).await.unwrap();
        store.record_view(video.id, alice.id).await.unwrap();

        VideoRepository::delete(&store, video.id).await.unwrap();

        assert!(CommentRepository::find_by_id(&store, comment.id).await.unwrap().is_none());
        assert!(store.state.read().await.likes.is_empty());
        let playlist = PlaylistRepository::find_by_id(&store, playlist.id)
            .await
            .unwrap()
            .unwrap();
        assert!(playlist.videos.is_empty());
        assert!(store.watch_history(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_playlist_add_is_idempotent() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let video = VideoRepository::create(&store, new_video(alice.id, "clip"))
            .await
            .unwrap();
        let playlist = PlaylistRepository::create(
            &store,
            NewPlaylist {
                name: "faves".to_string(),
                description: String::new(),
                owner_id: alice.id,
            },
        )
        .await
        .unwrap();

        store.add_video(playlist.id, video.id).await.unwrap();
        let playlist = store.add_video(playlist.id, video.id).await.unwrap().unwrap();
        assert_eq!(playlist.videos, vec![video.id]);
    }

    #[tokio::test]
    async fn test_channel_stats() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let video = VideoRepository::create(&store, new_video(alice.id, "clip"))
            .await
            .unwrap();
        store.record_view(video.id, bob.id).await.unwrap();
        LikeRepository::toggle(&store, bob.id, LikeTarget::Video(video.id))
            .await
            .unwrap();
        SubscriptionRepository::toggle(&store, bob.id, alice.id)
            .await
            .unwrap();

        let stats = store.channel_stats(alice.id).await.unwrap();
        assert_eq!(
            stats,
            ChannelStats {
                total_videos: 1,
                total_views: 1,
                total_subscribers: 1,
                total_likes: 1,
            }
        );

        let profile = store.channel_profile("alice", bob.id).await.unwrap().unwrap();
        assert_eq!(profile.subscribers_count, 1);
        assert!(profile.is_subscribed);
    }
}
