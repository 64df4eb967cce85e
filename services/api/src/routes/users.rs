//! Account, session and channel endpoints under `/users`

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, CurrentUser, FormData, require_fields},
    jwt::TokenPair,
    media::MediaKind,
    middleware::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    models::{
        ChangePasswordRequest, ChannelProfile, LoginRequest, LoginResponse, NewUser, PublicUser,
        RefreshTokenRequest, TokenResponse, UpdateAccountRequest, UpdateUser, User,
        VideoWithOwner,
    },
    password::{hash_password, verify_password},
    response::ApiResponse,
    state::AppState,
};

/// Routes reachable without a credential
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
}

/// Routes behind the auth middleware
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
}

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn with_tokens(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    jar.add(token_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .add(token_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
}

fn without_tokens(jar: CookieJar) -> CookieJar {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut cookie = token_cookie(name, String::new());
            cookie.make_removal();
            jar.add(cookie)
        })
}

/// Issue a fresh token pair and remember the refresh token as the only valid one
async fn issue_tokens(state: &AppState, user: &User) -> ApiResult<TokenPair> {
    let tokens = state.jwt.generate_token_pair(user).map_err(|e| {
        error!("Failed to generate tokens: {}", e);
        ApiError::Unexpected(e)
    })?;

    state
        .repos
        .users
        .set_refresh_token(user.id, Some(tokens.refresh_token.clone()))
        .await
        .map_err(ApiError::store("Failed to store refresh token"))?;

    Ok(tokens)
}

fn normalise(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Register a new account from a multipart form
pub async fn register(
    State(state): State<AppState>,
    mut form: FormData,
) -> ApiResult<ApiResponse<PublicUser>> {
    form.require(&["fullName", "email", "username", "password"], &["avatar"])?;
    let [full_name, email, username, password] = require_fields([
        ("fullName", form.text("fullName")),
        ("email", form.text("email")),
        ("username", form.text("username")),
        ("password", form.text("password")),
    ])?;
    let (email, username) = (normalise(&email), normalise(&username));

    info!("Registration attempt for user: {}", username);

    let existing = state
        .repos
        .users
        .find_by_identity(Some(&username), Some(&email))
        .await
        .map_err(ApiError::store("Failed to check existing users"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User with email or username already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&password)?;

    let avatar_file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::missing_fields(vec!["avatar"]))?;
    let avatar = state
        .media
        .upload(avatar_file, MediaKind::Image)
        .await
        .map_err(ApiError::media("Failed to upload avatar"))?;

    let cover_image = match form.take_file("coverImage") {
        Some(file) => match state.media.upload(file, MediaKind::Image).await {
            Ok(uploaded) => Some(uploaded.url),
            Err(e) => {
                state.media.delete(&avatar.url).await;
                return Err(ApiError::media("Failed to upload cover image")(e));
            }
        },
        None => None,
    };

    let created = state
        .repos
        .users
        .create(NewUser {
            username,
            email,
            full_name,
            avatar: avatar.url.clone(),
            cover_image: cover_image.clone(),
            password_hash,
        })
        .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            state.media.delete(&avatar.url).await;
            if let Some(url) = &cover_image {
                state.media.delete(url).await;
            }
            return Err(ApiError::store("Failed to register user")(e));
        }
    };

    info!("Registered user {}", user.id);
    Ok(ApiResponse::created(
        PublicUser::from(&user),
        "User registered successfully",
    ))
}

/// Log in with username or email and password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let username = payload
        .username
        .as_deref()
        .map(normalise)
        .filter(|v| !v.is_empty());
    let email = payload
        .email
        .as_deref()
        .map(normalise)
        .filter(|v| !v.is_empty());

    if username.is_none() && email.is_none() {
        return Err(ApiError::Validation {
            message: "username or email is required".to_string(),
            fields: vec!["username".to_string(), "email".to_string()],
        });
    }
    let [password] = require_fields([("password", payload.password)])?;

    info!(
        "Login attempt for user: {}",
        username.as_deref().or(email.as_deref()).unwrap_or_default()
    );

    let user = state
        .repos
        .users
        .find_by_identity(username.as_deref(), email.as_deref())
        .await
        .map_err(ApiError::store("Failed to look up user"))?
        .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid user credentials".to_string()));
    }

    let tokens = issue_tokens(&state, &user).await?;
    let jar = with_tokens(jar, &tokens);

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: PublicUser::from(&user),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

/// Trade a valid refresh token for a new token pair
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<ApiJson<RefreshTokenRequest>>,
) -> ApiResult<(CookieJar, ApiResponse<TokenResponse>)> {
    let incoming = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| payload.and_then(|ApiJson(body)| body.refresh_token))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    let claims = state
        .jwt
        .validate_refresh_token(&incoming)
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = state
        .repos
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(ApiError::store("Failed to look up user"))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        return Err(ApiError::Unauthorized(
            "Refresh token is expired or used".to_string(),
        ));
    }

    let tokens = issue_tokens(&state, &user).await?;
    let jar = with_tokens(jar, &tokens);

    Ok((
        jar,
        ApiResponse::ok(
            TokenResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "Access token refreshed",
        ),
    ))
}

/// Forget the stored refresh token and clear the cookies
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, ApiResponse<Value>)> {
    state
        .repos
        .users
        .set_refresh_token(user.id, None)
        .await
        .map_err(ApiError::store("Failed to log out"))?;

    info!("User {} logged out", user.id);
    Ok((
        without_tokens(jar),
        ApiResponse::ok(json!({}), "User logged out"),
    ))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let [old_password, new_password] = require_fields([
        ("oldPassword", payload.old_password),
        ("newPassword", payload.new_password),
    ])?;

    let stored = state
        .repos
        .users
        .find_by_id(user.id)
        .await
        .map_err(ApiError::store("Failed to look up user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&old_password, &stored.password_hash)? {
        return Err(ApiError::BadRequest("Invalid old password".to_string()));
    }

    let password_hash = hash_password(&new_password)?;
    state
        .repos
        .users
        .update(
            user.id,
            UpdateUser {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await
        .map_err(ApiError::store("Failed to change password"))?;

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> ApiResult<ApiResponse<PublicUser>> {
    Ok(ApiResponse::ok(user, "User fetched successfully"))
}

pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateAccountRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let [full_name, email] = require_fields([
        ("fullName", payload.full_name),
        ("email", payload.email),
    ])?;

    let updated = state
        .repos
        .users
        .update(
            user.id,
            UpdateUser {
                full_name: Some(full_name),
                email: Some(normalise(&email)),
                ..Default::default()
            },
        )
        .await
        .map_err(ApiError::store("Failed to update account"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        PublicUser::from(updated),
        "Account details updated successfully",
    ))
}

/// Which profile image an upload replaces
#[derive(Clone, Copy)]
enum ProfileImage {
    Avatar,
    Cover,
}

impl ProfileImage {
    fn field(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Cover => "coverImage",
        }
    }
}

async fn replace_profile_image(
    state: &AppState,
    user: PublicUser,
    mut form: FormData,
    image: ProfileImage,
) -> ApiResult<PublicUser> {
    let file = form
        .take_file(image.field())
        .ok_or_else(|| ApiError::missing_fields(vec![image.field()]))?;

    let uploaded = state
        .media
        .upload(file, MediaKind::Image)
        .await
        .map_err(ApiError::media("Failed to upload image"))?;

    let update = match image {
        ProfileImage::Avatar => UpdateUser {
            avatar: Some(uploaded.url.clone()),
            ..Default::default()
        },
        ProfileImage::Cover => UpdateUser {
            cover_image: Some(uploaded.url.clone()),
            ..Default::default()
        },
    };

    let updated = match state.repos.users.update(user.id, update).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            state.media.delete(&uploaded.url).await;
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            state.media.delete(&uploaded.url).await;
            return Err(ApiError::store("Failed to update image")(e));
        }
    };

    let previous = match image {
        ProfileImage::Avatar => Some(user.avatar),
        ProfileImage::Cover => user.cover_image,
    };
    if let Some(previous) = previous.filter(|url| *url != uploaded.url) {
        state.media.delete(&previous).await;
    }

    Ok(PublicUser::from(updated))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> ApiResult<ApiResponse<PublicUser>> {
    let user = replace_profile_image(&state, user, form, ProfileImage::Avatar).await?;
    Ok(ApiResponse::ok(user, "Avatar updated successfully"))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> ApiResult<ApiResponse<PublicUser>> {
    let user = replace_profile_image(&state, user, form, ProfileImage::Cover).await?;
    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}

/// Channel page with subscriber counts as seen by the caller
pub async fn channel_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<ApiResponse<ChannelProfile>> {
    let [username] = require_fields([("username", Some(username))])?;

    let profile = state
        .repos
        .users
        .channel_profile(&normalise(&username), user.id)
        .await
        .map_err(ApiError::store("Failed to fetch channel"))?
        .ok_or_else(|| ApiError::NotFound("Channel does not exist".to_string()))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

pub async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ApiResponse<Vec<VideoWithOwner>>> {
    let history = state
        .repos
        .users
        .watch_history(user.id)
        .await
        .map_err(ApiError::store("Failed to fetch watch history"))?;

    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}
