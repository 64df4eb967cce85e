//! Authentication gate and error boundary middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::any::Any;
use tracing::{debug, error, warn};

use crate::{
    error::{ApiError, ErrorTrace},
    models::PublicUser,
    state::AppState,
};

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Access token from the `accessToken` cookie or an `Authorization: Bearer` header
fn access_token(req: &Request) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Authentication middleware
///
/// Resolves the caller from the access token and stores a [`PublicUser`] in
/// the request extensions for the `CurrentUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = access_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    let claims = state.jwt.validate_access_token(&token).map_err(|e| {
        debug!("Rejected access token: {}", e);
        ApiError::Unauthorized("Invalid access token".to_string())
    })?;

    let user = state
        .repos
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(ApiError::store("Failed to load authenticated user"))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

    req.extensions_mut().insert(PublicUser::from(user));

    Ok(next.run(req).await)
}

/// Error boundary
///
/// Outside production, error envelopes get the error's source chain added as
/// `data.stack`.
pub async fn error_boundary(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    if state.config.is_production() {
        return response;
    }
    let Some(ErrorTrace(trace)) = response.extensions().get::<ErrorTrace>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not buffer error response: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut envelope: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    if let Some(data) = envelope.get_mut("data").and_then(|d| d.as_object_mut()) {
        data.insert("stack".to_string(), serde_json::json!(trace));
    }

    let body = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}

/// Render a caught panic as a 500 envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Handler panicked: {}", detail);
    ApiError::Unexpected(anyhow::anyhow!("panic: {}", detail)).into_response()
}

/// Envelope for unknown routes
pub async fn fallback(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}
