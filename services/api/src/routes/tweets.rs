//! Tweet endpoints under `/tweets`

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use uuid::Uuid;

use super::ensure_owner;
use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, CurrentUser, parse_id, require_fields},
    models::{ContentRequest, NewTweet, Tweet},
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:user_id", get(user_tweets))
        .route("/:tweet_id", patch(update_tweet).delete(delete_tweet))
}

async fn find_tweet(state: &AppState, tweet_id: Uuid) -> ApiResult<Tweet> {
    state
        .repos
        .tweets
        .find_by_id(tweet_id)
        .await
        .map_err(ApiError::store("Failed to fetch tweet"))?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".to_string()))
}

pub async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ContentRequest>,
) -> ApiResult<ApiResponse<Tweet>> {
    let [content] = require_fields([("content", payload.content)])?;

    let tweet = state
        .repos
        .tweets
        .create(NewTweet {
            content,
            owner_id: user.id,
        })
        .await
        .map_err(ApiError::store("Failed to create tweet"))?;

    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

/// Tweets of a user, newest first
pub async fn user_tweets(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(user_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Vec<Tweet>>> {
    let user_id = parse_id("userId", &user_id)?;

    state
        .repos
        .users
        .find_by_id(user_id)
        .await
        .map_err(ApiError::store("Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let tweets = state
        .repos
        .tweets
        .list_for_owner(user_id)
        .await
        .map_err(ApiError::store("Failed to fetch tweets"))?;

    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(tweet_id): ApiPath<String>,
    ApiJson(payload): ApiJson<ContentRequest>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet_id = parse_id("tweetId", &tweet_id)?;
    let [content] = require_fields([("content", payload.content)])?;

    let existing = find_tweet(&state, tweet_id).await?;
    ensure_owner(existing.owner_id, &user, "update this tweet")?;

    let tweet = state
        .repos
        .tweets
        .update_content(tweet_id, content)
        .await
        .map_err(ApiError::store("Failed to update tweet"))?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".to_string()))?;

    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(tweet_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet_id = parse_id("tweetId", &tweet_id)?;

    let existing = find_tweet(&state, tweet_id).await?;
    ensure_owner(existing.owner_id, &user, "delete this tweet")?;

    let tweet = state
        .repos
        .tweets
        .delete(tweet_id)
        .await
        .map_err(ApiError::store("Failed to delete tweet"))?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".to_string()))?;

    Ok(ApiResponse::ok(tweet, "Tweet deleted successfully"))
}
