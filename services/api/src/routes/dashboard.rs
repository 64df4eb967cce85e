//! Channel owner dashboard under `/dashboard`

use axum::{Router, extract::State, routing::get};
use vidtube_common::pagination::{Page, PageRequest};

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiQuery, CurrentUser},
    models::{ChannelStats, VideoListQuery, VideoWithOwner},
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
}

pub async fn channel_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ApiResponse<ChannelStats>> {
    let stats = state
        .repos
        .dashboard
        .channel_stats(user.id)
        .await
        .map_err(ApiError::store("Failed to fetch channel stats"))?;

    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// The caller's own videos, unpublished ones included
pub async fn channel_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<VideoListQuery>,
) -> ApiResult<ApiResponse<Page<VideoWithOwner>>> {
    let filter = query.filter(Some(user.id), false);
    let page = state
        .repos
        .videos
        .list(&filter, PageRequest::new(query.page, query.limit))
        .await
        .map_err(ApiError::store("Failed to fetch channel videos"))?;

    Ok(ApiResponse::ok(page, "Channel videos fetched successfully"))
}
