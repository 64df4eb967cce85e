//! Application configuration loaded from the environment
//!
//! Values are read with the `config` crate from process environment variables
//! (after `.env` has been loaded by `main`). Keys are matched case
//! insensitively, so `ACCESS_TOKEN_SECRET` fills `access_token_secret`.

use config::{Config, Environment};
use serde::Deserialize;
use std::{path::PathBuf, str::FromStr};
use thiserror::Error;

use crate::jwt::JwtConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The environment could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was present but not acceptable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Deployment environment, controls diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Invalid(format!("unknown APP_ENV '{}'", other))),
        }
    }
}

/// Entity store implementation selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid(format!(
                "unknown STORE_BACKEND '{}'",
                other
            ))),
        }
    }
}

/// Media storage selected at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaBackend {
    /// Files are written below a local directory and served at `/media`
    Local { dir: PathBuf },
    /// Files are uploaded to an S3 bucket
    S3 { bucket: String },
}

/// Media storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    /// Base URL prepended to stored object keys
    pub public_url: String,
    /// Largest accepted request body for uploads
    pub max_upload_bytes: usize,
    /// ffprobe binary used to read video durations
    pub ffprobe_path: String,
}

/// Fully validated application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origin: String,
    pub environment: AppEnvironment,
    pub store_backend: StoreBackend,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_cors_origin")]
    cors_origin: String,
    #[serde(default = "default_app_env")]
    app_env: String,
    #[serde(default = "default_store_backend")]
    store_backend: String,
    access_token_secret: Option<String>,
    #[serde(default = "default_access_token_expiry")]
    access_token_expiry: u64,
    refresh_token_secret: Option<String>,
    #[serde(default = "default_refresh_token_expiry")]
    refresh_token_expiry: u64,
    #[serde(default = "default_media_backend")]
    media_backend: String,
    media_bucket: Option<String>,
    media_public_url: Option<String>,
    #[serde(default = "default_media_local_dir")]
    media_local_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    max_upload_bytes: usize,
    #[serde(default = "default_ffprobe_path")]
    ffprobe_path: String,
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_store_backend() -> String {
    "postgres".to_string()
}

fn default_access_token_expiry() -> u64 {
    86_400 // 1 day
}

fn default_refresh_token_expiry() -> u64 {
    864_000 // 10 days
}

fn default_media_backend() -> String {
    "local".to_string()
}

fn default_media_local_dir() -> String {
    "./public/media".to_string()
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PORT`: listening port (default: 8000)
    /// - `CORS_ORIGIN`: allowed origin, `*` for any (default: `*`)
    /// - `APP_ENV`: development, test or production (default: development)
    /// - `STORE_BACKEND`: postgres or memory (default: postgres)
    /// - `ACCESS_TOKEN_SECRET` / `REFRESH_TOKEN_SECRET`: signing secrets (required)
    /// - `ACCESS_TOKEN_EXPIRY` / `REFRESH_TOKEN_EXPIRY`: lifetimes in seconds
    /// - `MEDIA_BACKEND`: local or s3 (default: local)
    /// - `MEDIA_BUCKET`: bucket name, required for s3
    /// - `MEDIA_PUBLIC_URL`: base URL of stored media
    /// - `MEDIA_LOCAL_DIR`: directory for local media (default: ./public/media)
    /// - `MAX_UPLOAD_BYTES`: request body limit for uploads (default: 100 MiB)
    /// - `FFPROBE_PATH`: ffprobe binary (default: ffprobe)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let access_token_secret = required_secret(raw.access_token_secret, "ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret =
            required_secret(raw.refresh_token_secret, "REFRESH_TOKEN_SECRET")?;

        let backend = match raw.media_backend.trim().to_ascii_lowercase().as_str() {
            "local" => MediaBackend::Local {
                dir: PathBuf::from(&raw.media_local_dir),
            },
            "s3" => MediaBackend::S3 {
                bucket: raw
                    .media_bucket
                    .filter(|bucket| !bucket.trim().is_empty())
                    .ok_or_else(|| {
                        ConfigError::Invalid("MEDIA_BUCKET is required for s3 media".to_string())
                    })?,
            },
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown MEDIA_BACKEND '{}'",
                    other
                )));
            }
        };

        let public_url = match (&backend, raw.media_public_url) {
            (_, Some(url)) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            (MediaBackend::Local { .. }, _) => format!("http://localhost:{}/media", raw.port),
            (MediaBackend::S3 { bucket }, _) => format!("https://{}.s3.amazonaws.com", bucket),
        };

        Ok(Self {
            port: raw.port,
            cors_origin: raw.cors_origin,
            environment: raw.app_env.parse()?,
            store_backend: raw.store_backend.parse()?,
            jwt: JwtConfig {
                access_token_secret,
                access_token_expiry: raw.access_token_expiry,
                refresh_token_secret,
                refresh_token_expiry: raw.refresh_token_expiry,
            },
            media: MediaConfig {
                backend,
                public_url,
                max_upload_bytes: raw.max_upload_bytes,
                ffprobe_path: raw.ffprobe_path,
            },
        })
    }

    /// Whether diagnostic traces must be withheld from clients
    pub fn is_production(&self) -> bool {
        self.environment == AppEnvironment::Production
    }
}

fn required_secret(value: Option<String>, name: &str) -> Result<String, ConfigError> {
    value
        .filter(|secret| !secret.trim().is_empty())
        .ok_or_else(|| ConfigError::Invalid(format!("{} must be set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "PORT",
        "APP_ENV",
        "STORE_BACKEND",
        "ACCESS_TOKEN_SECRET",
        "REFRESH_TOKEN_SECRET",
        "ACCESS_TOKEN_EXPIRY",
        "MEDIA_BACKEND",
        "MEDIA_BUCKET",
        "MEDIA_PUBLIC_URL",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    fn set_secrets() {
        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "access-secret");
            std::env::set_var("REFRESH_TOKEN_SECRET", "refresh-secret");
        }
    }

    #[test]
    #[serial]
    fn test_app_config_defaults() {
        clear_env();
        set_secrets();

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.jwt.access_token_expiry, 86_400);
        assert_eq!(config.jwt.refresh_token_expiry, 864_000);
        assert_eq!(config.media.public_url, "http://localhost:8000/media");
        assert!(matches!(config.media.backend, MediaBackend::Local { .. }));
        assert!(!config.is_production());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_app_config_custom_values() {
        clear_env();
        set_secrets();
        unsafe {
            std::env::set_var("PORT", "9100");
            std::env::set_var("APP_ENV", "production");
            std::env::set_var("STORE_BACKEND", "memory");
            std::env::set_var("ACCESS_TOKEN_EXPIRY", "60");
            std::env::set_var("MEDIA_BACKEND", "s3");
            std::env::set_var("MEDIA_BUCKET", "vidtube-media");
        }

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, 9100);
        assert!(config.is_production());
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.jwt.access_token_expiry, 60);
        assert_eq!(
            config.media.backend,
            MediaBackend::S3 {
                bucket: "vidtube-media".to_string()
            }
        );
        assert_eq!(
            config.media.public_url,
            "https://vidtube-media.s3.amazonaws.com"
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_app_config_requires_secrets() {
        clear_env();

        let result = AppConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    #[serial]
    fn test_app_config_s3_requires_bucket() {
        clear_env();
        set_secrets();
        unsafe {
            std::env::set_var("MEDIA_BACKEND", "s3");
        }

        let result = AppConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        clear_env();
    }

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }
}
