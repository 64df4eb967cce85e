//! Application state shared across handlers

use std::sync::Arc;

use crate::{config::AppConfig, jwt::JwtService, media::MediaService, repositories::Repositories};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub repos: Repositories,
    pub media: MediaService,
}

impl AppState {
    pub fn new(config: AppConfig, repos: Repositories, media: MediaService) -> Self {
        Self {
            jwt: JwtService::new(config.jwt.clone()),
            config: Arc::new(config),
            repos,
            media,
        }
    }
}
