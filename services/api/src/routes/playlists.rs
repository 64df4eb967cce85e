//! Playlist endpoints under `/playlists`

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use uuid::Uuid;

use super::{ensure_owner, videos::visible_video};
use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, CurrentUser, parse_id, require_fields},
    models::{NewPlaylist, Playlist, PlaylistRequest, PublicUser},
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/:user_id", get(user_playlists))
        .route(
            "/:playlist_id",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/:video_id/:playlist_id", patch(add_video))
        .route("/remove/:video_id/:playlist_id", patch(remove_video))
}

async fn find_playlist(state: &AppState, playlist_id: Uuid) -> ApiResult<Playlist> {
    state
        .repos
        .playlists
        .find_by_id(playlist_id)
        .await
        .map_err(ApiError::store("Failed to fetch playlist"))?
        .ok_or_else(|| ApiError::NotFound("Playlist not found".to_string()))
}

/// Look up a playlist the caller is allowed to modify
async fn owned_playlist(
    state: &AppState,
    user: &PublicUser,
    playlist_id: Uuid,
    action: &str,
) -> ApiResult<Playlist> {
    let playlist = find_playlist(state, playlist_id).await?;
    ensure_owner(playlist.owner_id, user, action)?;
    Ok(playlist)
}

fn playlist_not_found() -> ApiError {
    ApiError::NotFound("Playlist not found".to_string())
}

fn description_of(request: &PlaylistRequest) -> Option<String> {
    request.description.as_deref().map(|d| d.trim().to_string())
}

pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<PlaylistRequest>,
) -> ApiResult<ApiResponse<Playlist>> {
    let description = description_of(&payload).unwrap_or_default();
    let [name] = require_fields([("name", payload.name)])?;

    let playlist = state
        .repos
        .playlists
        .create(NewPlaylist {
            name,
            description,
            owner_id: user.id,
        })
        .await
        .map_err(ApiError::store("Failed to create playlist"))?;

    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

pub async fn user_playlists(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(user_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Vec<Playlist>>> {
    let user_id = parse_id("userId", &user_id)?;

    state
        .repos
        .users
        .find_by_id(user_id)
        .await
        .map_err(ApiError::store("Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let playlists = state
        .repos
        .playlists
        .list_for_owner(user_id)
        .await
        .map_err(ApiError::store("Failed to fetch playlists"))?;

    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(playlist_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist_id = parse_id("playlistId", &playlist_id)?;
    let playlist = find_playlist(&state, playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

/// Rename a playlist; the description is only changed when sent
pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(playlist_id): ApiPath<String>,
    ApiJson(payload): ApiJson<PlaylistRequest>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist_id = parse_id("playlistId", &playlist_id)?;
    let description = description_of(&payload);
    let [name] = require_fields([("name", payload.name)])?;

    owned_playlist(&state, &user, playlist_id, "update this playlist").await?;

    let playlist = state
        .repos
        .playlists
        .update(playlist_id, Some(name), description)
        .await
        .map_err(ApiError::store("Failed to update playlist"))?
        .ok_or_else(playlist_not_found)?;

    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(playlist_id): ApiPath<String>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist_id = parse_id("playlistId", &playlist_id)?;
    owned_playlist(&state, &user, playlist_id, "delete this playlist").await?;

    let playlist = state
        .repos
        .playlists
        .delete(playlist_id)
        .await
        .map_err(ApiError::store("Failed to delete playlist"))?
        .ok_or_else(playlist_not_found)?;

    Ok(ApiResponse::ok(playlist, "Playlist deleted successfully"))
}

fn parse_pair(video_id: &str, playlist_id: &str) -> ApiResult<(Uuid, Uuid)> {
    let invalid: Vec<&str> = [("videoId", video_id), ("playlistId", playlist_id)]
        .into_iter()
        .filter(|(_, value)| Uuid::parse_str(value.trim()).is_err())
        .map(|(field, _)| field)
        .collect();

    if !invalid.is_empty() {
        return Err(ApiError::Validation {
            message: format!("Invalid {}", invalid.join(", ")),
            fields: invalid.into_iter().map(str::to_string).collect(),
        });
    }

    Ok((parse_id("videoId", video_id)?, parse_id("playlistId", playlist_id)?))
}

/// Append a video to a playlist; adding it twice keeps one entry
pub async fn add_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((video_id, playlist_id)): ApiPath<(String, String)>,
) -> ApiResult<ApiResponse<Playlist>> {
    let (video_id, playlist_id) = parse_pair(&video_id, &playlist_id)?;
    owned_playlist(&state, &user, playlist_id, "modify this playlist").await?;

    visible_video(&state, video_id, &user).await?;

    let playlist = state
        .repos
        .playlists
        .add_video(playlist_id, video_id)
        .await
        .map_err(ApiError::store("Failed to add video to playlist"))?
        .ok_or_else(playlist_not_found)?;

    Ok(ApiResponse::ok(
        playlist,
        "Video added to playlist successfully",
    ))
}

pub async fn remove_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((video_id, playlist_id)): ApiPath<(String, String)>,
) -> ApiResult<ApiResponse<Playlist>> {
    let (video_id, playlist_id) = parse_pair(&video_id, &playlist_id)?;
    let playlist = owned_playlist(&state, &user, playlist_id, "modify this playlist").await?;

    if !playlist.videos.contains(&video_id) {
        return Err(ApiError::NotFound(
            "Video not found in playlist".to_string(),
        ));
    }

    let playlist = state
        .repos
        .playlists
        .remove_video(playlist_id, video_id)
        .await
        .map_err(ApiError::store("Failed to remove video from playlist"))?
        .ok_or_else(playlist_not_found)?;

    Ok(ApiResponse::ok(
        playlist,
        "Video removed from playlist successfully",
    ))
}
