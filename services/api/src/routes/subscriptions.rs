//! Channel subscriptions under `/subscriptions`

use axum::{Router, extract::State, routing::get};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiPath, CurrentUser, parse_id},
    models::{SubscriptionStatus, UserSummary},
    repositories::Toggle,
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/c/:channel_id",
            get(channel_subscribers).post(toggle_subscription),
        )
        .route("/u/:subscriber_id", get(subscribed_channels))
}

async fn ensure_user_exists(state: &AppState, id: Uuid, what: &str) -> ApiResult<()> {
    state
        .repos
        .users
        .find_by_id(id)
        .await
        .map_err(ApiError::store("Failed to fetch user"))?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", what)))
}

/// Subscribe to a channel, or unsubscribe when already subscribed
pub async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(channel_id): ApiPath<String>,
) -> ApiResult<ApiResponse<SubscriptionStatus>> {
    let channel_id = parse_id("channelId", &channel_id)?;

    if channel_id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot subscribe to your own channel".to_string(),
        ));
    }
    ensure_user_exists(&state, channel_id, "Channel").await?;

    let toggled = state
        .repos
        .subscriptions
        .toggle(user.id, channel_id)
        .await
        .map_err(ApiError::store("Failed to toggle subscription"))?;

    Ok(match toggled {
        Toggle::Created(subscription) => {
            info!("User {} subscribed to {}", user.id, channel_id);
            ApiResponse::ok(
                SubscriptionStatus {
                    is_subscribed: true,
                    subscription: Some(subscription),
                },
                "Subscribed successfully",
            )
        }
        Toggle::Removed => ApiResponse::ok(
            SubscriptionStatus {
                is_subscribed: false,
                subscription: None,
            },
            "Unsubscribed successfully",
        ),
    })
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(channel_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Vec<UserSummary>>> {
    let channel_id = parse_id("channelId", &channel_id)?;
    ensure_user_exists(&state, channel_id, "Channel").await?;

    let subscribers = state
        .repos
        .subscriptions
        .subscribers(channel_id)
        .await
        .map_err(ApiError::store("Failed to fetch subscribers"))?;

    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(subscriber_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Vec<UserSummary>>> {
    let subscriber_id = parse_id("subscriberId", &subscriber_id)?;
    ensure_user_exists(&state, subscriber_id, "Subscriber").await?;

    let channels = state
        .repos
        .subscriptions
        .subscribed_channels(subscriber_id)
        .await
        .map_err(ApiError::store("Failed to fetch subscribed channels"))?;

    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
