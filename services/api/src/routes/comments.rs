//! Comment endpoints under `/comments`

use axum::{
    Router,
    extract::State,
    routing::{get, patch},
};
use uuid::Uuid;
use vidtube_common::pagination::{Page, PageRequest};

use super::{ensure_owner, videos::visible_video};
use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser, parse_id, require_fields},
    models::{Comment, ContentRequest, NewComment, PageQuery},
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:video_id", get(list_comments).post(add_comment))
        .route(
            "/c/:comment_id",
            patch(update_comment).delete(delete_comment),
        )
}

async fn find_comment(state: &AppState, comment_id: Uuid) -> ApiResult<Comment> {
    state
        .repos
        .comments
        .find_by_id(comment_id)
        .await
        .map_err(ApiError::store("Failed to fetch comment"))?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))
}

/// Comments of a video, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<ApiResponse<Page<Comment>>> {
    let video_id = parse_id("videoId", &video_id)?;
    visible_video(&state, video_id, &user).await?;

    let page = state
        .repos
        .comments
        .list_for_video(video_id, PageRequest::new(query.page, query.limit))
        .await
        .map_err(ApiError::store("Failed to fetch comments"))?;

    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
    ApiJson(payload): ApiJson<ContentRequest>,
) -> ApiResult<ApiResponse<Comment>> {
    let video_id = parse_id("videoId", &video_id)?;
    let [content] = require_fields([("content", payload.content)])?;
    visible_video(&state, video_id, &user).await?;

    let comment = state
        .repos
        .comments
        .create(NewComment {
            content,
            video_id,
            owner_id: user.id,
        })
        .await
        .map_err(ApiError::store("Failed to add comment"))?;

    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(comment_id): ApiPath<String>,
    ApiJson(payload): ApiJson<ContentRequest>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment_id = parse_id("commentId", &comment_id)?;
    let [content] = require_fields([("content", payload.content)])?;

    let existing = find_comment(&state, comment_id).await?;
    ensure_owner(existing.owner_id, &user, "update this comment")?;

    let comment = state
        .repos
        .comments
        .update_content(comment_id, content)
        .await
        .map_err(ApiError::store("Failed to update comment"))?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(comment_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment_id = parse_id("commentId", &comment_id)?;

    let existing = find_comment(&state, comment_id).await?;
    ensure_owner(existing.owner_id, &user, "delete this comment")?;

    let comment = state
        .repos
        .comments
        .delete(comment_id)
        .await
        .map_err(ApiError::store("Failed to delete comment"))?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(ApiResponse::ok(comment, "Comment deleted successfully"))
}
