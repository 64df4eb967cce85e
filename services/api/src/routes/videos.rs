//! Video endpoints under `/videos`

use axum::{
    Router,
    extract::State,
    routing::{get, patch},
};
use tracing::{info, warn};
use uuid::Uuid;
use vidtube_common::pagination::{Page, PageRequest};

use super::ensure_owner;
use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery, CurrentUser, FormData, parse_id},
    media::MediaKind,
    models::{NewVideo, PublicUser, UpdateVideo, Video, VideoListQuery, VideoWithOwner},
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/:video_id",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/toggle/publish/:video_id", patch(toggle_publish))
}

async fn find_video(state: &AppState, video_id: Uuid) -> ApiResult<Video> {
    state
        .repos
        .videos
        .find_by_id(video_id)
        .await
        .map_err(ApiError::store("Failed to fetch video"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))
}

/// A video the caller may see, unpublished ones count as missing for non-owners
pub(crate) async fn visible_video(
    state: &AppState,
    video_id: Uuid,
    user: &PublicUser,
) -> ApiResult<Video> {
    let video = find_video(state, video_id).await?;
    if video.is_visible_to(user.id) {
        Ok(video)
    } else {
        Err(ApiError::NotFound("Video not found".to_string()))
    }
}

/// Published videos, filtered, sorted and paginated
pub async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(query): ApiQuery<VideoListQuery>,
) -> ApiResult<ApiResponse<Page<VideoWithOwner>>> {
    let owner_id = match query.user_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Some(parse_id("userId", id)?),
        _ => None,
    };

    let filter = query.filter(owner_id, true);
    let page = state
        .repos
        .videos
        .list(&filter, PageRequest::new(query.page, query.limit))
        .await
        .map_err(ApiError::store("Failed to fetch videos"))?;

    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// Upload a video file with its thumbnail
pub async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut form: FormData,
) -> ApiResult<ApiResponse<Video>> {
    form.require(&["title", "description"], &["videoFile", "thumbnail"])?;
    let title = form.text("title").unwrap_or_default();
    let description = form.text("description").unwrap_or_default();
    let explicit_duration = form
        .text("duration")
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    let (Some(video_file), Some(thumbnail_file)) =
        (form.take_file("videoFile"), form.take_file("thumbnail"))
    else {
        return Err(ApiError::missing_fields(vec!["videoFile", "thumbnail"]));
    };

    info!("User {} uploading video '{}'", user.id, title);

    let video_upload = state
        .media
        .upload(video_file, MediaKind::Video)
        .await
        .map_err(ApiError::media("Failed to upload video file"))?;

    let thumbnail = match state.media.upload(thumbnail_file, MediaKind::Image).await {
        Ok(uploaded) => uploaded,
        Err(e) => {
            state.media.delete(&video_upload.url).await;
            return Err(ApiError::media("Failed to upload thumbnail")(e));
        }
    };

    let duration = explicit_duration.or(video_upload.duration).unwrap_or_else(|| {
        warn!("No duration known for uploaded video, storing 0");
        0.0
    });

    let created = state
        .repos
        .videos
        .create(NewVideo {
            owner_id: user.id,
            title,
            description,
            video_file: video_upload.url.clone(),
            thumbnail: thumbnail.url.clone(),
            duration,
        })
        .await;

    match created {
        Ok(video) => Ok(ApiResponse::created(video, "Video uploaded successfully")),
        Err(e) => {
            state.media.delete(&video_upload.url).await;
            state.media.delete(&thumbnail.url).await;
            Err(ApiError::store("Failed to create video")(e))
        }
    }
}

/// Fetch one video and count the view
///
/// Unpublished videos are only visible to their owner.
pub async fn get_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> ApiResult<ApiResponse<VideoWithOwner>> {
    let video_id = parse_id("videoId", &video_id)?;

    let mut video = state
        .repos
        .videos
        .find_with_owner(video_id)
        .await
        .map_err(ApiError::store("Failed to fetch video"))?
        .filter(|v| v.video.is_visible_to(user.id))
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    state
        .repos
        .videos
        .record_view(video_id, user.id)
        .await
        .map_err(ApiError::store("Failed to record view"))?;
    video.video.views += 1;

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

/// Update title and description, optionally replacing the thumbnail
pub async fn update_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
    mut form: FormData,
) -> ApiResult<ApiResponse<Video>> {
    let video_id = parse_id("videoId", &video_id)?;
    form.require(&["title", "description"], &[])?;

    let existing = find_video(&state, video_id).await?;
    ensure_owner(existing.owner_id, &user, "update this video")?;

    let thumbnail = match form.take_file("thumbnail") {
        Some(file) => Some(
            state
                .media
                .upload(file, MediaKind::Image)
                .await
                .map_err(ApiError::media("Failed to upload thumbnail"))?
                .url,
        ),
        None => None,
    };

    let updated = state
        .repos
        .videos
        .update(
            video_id,
            UpdateVideo {
                title: form.text("title"),
                description: form.text("description"),
                thumbnail: thumbnail.clone(),
            },
        )
        .await;

    let video = match updated {
        Ok(Some(video)) => video,
        Ok(None) => {
            if let Some(url) = &thumbnail {
                state.media.delete(url).await;
            }
            return Err(ApiError::NotFound("Video not found".to_string()));
        }
        Err(e) => {
            if let Some(url) = &thumbnail {
                state.media.delete(url).await;
            }
            return Err(ApiError::store("Failed to update video")(e));
        }
    };

    if thumbnail.is_some() {
        state.media.delete(&existing.thumbnail).await;
    }

    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Video>> {
    let video_id = parse_id("videoId", &video_id)?;

    let existing = find_video(&state, video_id).await?;
    ensure_owner(existing.owner_id, &user, "delete this video")?;

    let video = state
        .repos
        .videos
        .delete(video_id)
        .await
        .map_err(ApiError::store("Failed to delete video"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    state.media.delete(&video.video_file).await;
    state.media.delete(&video.thumbnail).await;

    info!("Video {} deleted by {}", video.id, user.id);
    Ok(ApiResponse::ok(video, "Video deleted successfully"))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Video>> {
    let video_id = parse_id("videoId", &video_id)?;

    let existing = find_video(&state, video_id).await?;
    ensure_owner(existing.owner_id, &user, "change this video")?;

    let video = state
        .repos
        .videos
        .toggle_publish(video_id)
        .await
        .map_err(ApiError::store("Failed to toggle publish status"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    Ok(ApiResponse::ok(
        video,
        "Video publish status toggled successfully",
    ))
}
