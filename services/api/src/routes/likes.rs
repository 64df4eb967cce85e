//! Like toggles under `/likes`

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiPath, CurrentUser, parse_id},
    models::{LikeStatus, LikeTarget, PublicUser, VideoWithOwner},
    repositories::Toggle,
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/:video_id", post(toggle_video_like))
        .route("/toggle/c/:comment_id", post(toggle_comment_like))
        .route("/toggle/t/:tweet_id", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}

async fn toggle_like(
    state: &AppState,
    user: &PublicUser,
    target: LikeTarget,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let exists = match target {
        LikeTarget::Video(id) => state
            .repos
            .videos
            .find_by_id(id)
            .await
            .map(|v| v.is_some_and(|v| v.is_visible_to(user.id))),
        LikeTarget::Comment(id) => state
            .repos
            .comments
            .find_by_id(id)
            .await
            .map(|c| c.is_some()),
        LikeTarget::Tweet(id) => state
            .repos
            .tweets
            .find_by_id(id)
            .await
            .map(|t| t.is_some()),
    }
    .map_err(ApiError::store("Failed to fetch like target"))?;

    if !exists {
        return Err(ApiError::NotFound(format!("{} not found", target.kind())));
    }

    let toggled = state
        .repos
        .likes
        .toggle(user.id, target)
        .await
        .map_err(ApiError::store("Failed to toggle like"))?;

    Ok(match toggled {
        Toggle::Created(like) => ApiResponse::ok(
            LikeStatus {
                is_liked: true,
                like: Some(like),
            },
            "Liked successfully",
        ),
        Toggle::Removed => ApiResponse::ok(
            LikeStatus {
                is_liked: false,
                like: None,
            },
            "Unliked successfully",
        ),
    })
}

pub async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let video_id = parse_id("videoId", &video_id)?;
    toggle_like(&state, &user, LikeTarget::Video(video_id)).await
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(comment_id): ApiPath<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let comment_id = parse_id("commentId", &comment_id)?;
    toggle_like(&state, &user, LikeTarget::Comment(comment_id)).await
}

pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(tweet_id): ApiPath<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let tweet_id = parse_id("tweetId", &tweet_id)?;
    toggle_like(&state, &user, LikeTarget::Tweet(tweet_id)).await
}

/// Published videos the caller liked, an empty list is not an error
pub async fn liked_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ApiResponse<Vec<VideoWithOwner>>> {
    let videos = state
        .repos
        .likes
        .liked_videos(user.id)
        .await
        .map_err(ApiError::store("Failed to fetch liked videos"))?;

    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
