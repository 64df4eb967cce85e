//! API service routes
//!
//! Every resource lives under `/api/v1`. Apart from registration, login,
//! token refresh and the health check, routes sit behind the auth middleware.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::MediaBackend,
    error::ApiError,
    middleware::{auth_middleware, error_boundary, fallback, handle_panic},
    models::PublicUser,
    state::AppState,
};

pub mod comments;
pub mod dashboard;
pub mod health;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let api = Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .nest(
            "/users",
            users::public_routes().merge(users::protected_routes().route_layer(auth.clone())),
        )
        .nest("/videos", videos::routes().route_layer(auth.clone()))
        .nest("/comments", comments::routes().route_layer(auth.clone()))
        .nest("/likes", likes::routes().route_layer(auth.clone()))
        .nest("/playlists", playlists::routes().route_layer(auth.clone()))
        .nest(
            "/subscriptions",
            subscriptions::routes().route_layer(auth.clone()),
        )
        .nest("/tweets", tweets::routes().route_layer(auth.clone()))
        .nest("/dashboard", dashboard::routes().route_layer(auth));

    let mut router = Router::new().nest("/api/v1", api);

    if let MediaBackend::Local { dir } = &state.config.media.backend {
        router = router.nest_service("/media", ServeDir::new(dir));
    }

    router
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), error_boundary))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let origin = origin.trim();
    if origin == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(e) => {
            warn!("Invalid CORS_ORIGIN '{}', cross-origin requests are denied: {}", origin, e);
            CorsLayer::new()
        }
    }
}

/// Reject a mutation attempted by someone other than the owner
pub(crate) fn ensure_owner(owner_id: Uuid, user: &PublicUser, action: &str) -> Result<(), ApiError> {
    if owner_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("You are not allowed to {}", action)))
    }
}
