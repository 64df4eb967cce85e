//! Media storage for uploaded avatars, cover images, thumbnails and videos
//!
//! Files land either in a local directory (served by the API under `/media`)
//! or in an S3 bucket. Either way the client receives a public URL built from
//! the configured base URL and the object key.

use async_trait::async_trait;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use axum::body::Bytes;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{MediaBackend, MediaConfig};

/// Longest an ffprobe run may take before the upload goes on without a duration
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Media storage errors
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media upload failed: {0}")]
    Upload(String),
}

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// What an upload is used for, decides the key prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    /// Length in seconds, when it could be probed
    pub duration: Option<f64>,
}

/// Object storage backend
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn put(&self, key: &str, content_type: Option<&str>, bytes: Bytes)
    -> Result<(), MediaError>;

    async fn remove(&self, key: &str) -> Result<(), MediaError>;
}

/// Stores objects below a local directory
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn put(
        &self,
        key: &str,
        _content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<(), MediaError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Stores objects in an S3 bucket
#[derive(Clone)]
pub struct S3MediaStorage {
    client: Client,
    bucket: String,
}

impl S3MediaStorage {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Build a client from the default AWS credential chain
    pub async fn from_env(bucket: String) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&aws_config), bucket)
    }
}

#[async_trait]
impl MediaStorage for S3MediaStorage {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<(), MediaError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| MediaError::Upload(DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {} to bucket {}", key, self.bucket);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MediaError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| MediaError::Upload(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

/// Uploads files and turns keys into public URLs
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn MediaStorage>,
    public_url: String,
    ffprobe_path: String,
}

impl MediaService {
    pub fn new(storage: Arc<dyn MediaStorage>, public_url: &str, ffprobe_path: &str) -> Self {
        Self {
            storage,
            public_url: public_url.trim_end_matches('/').to_string(),
            ffprobe_path: ffprobe_path.to_string(),
        }
    }

    /// Build the storage selected by configuration
    pub async fn from_config(config: &MediaConfig) -> Self {
        let storage: Arc<dyn MediaStorage> = match &config.backend {
            MediaBackend::Local { dir } => Arc::new(LocalMediaStorage::new(dir.clone())),
            MediaBackend::S3 { bucket } => Arc::new(S3MediaStorage::from_env(bucket.clone()).await),
        };
        Self::new(storage, &config.public_url, &config.ffprobe_path)
    }

    /// Store a file and return its public URL; videos are probed for duration
    pub async fn upload(&self, file: MediaFile, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        let key = object_key(kind, file.file_name.as_deref());

        let duration = match kind {
            MediaKind::Video => self.probe_duration(&file.bytes).await,
            MediaKind::Image => None,
        };

        self.storage
            .put(&key, file.content_type.as_deref(), file.bytes)
            .await?;

        Ok(UploadedMedia {
            url: format!("{}/{}", self.public_url, key),
            duration,
        })
    }

    /// Delete a previously uploaded file, failures are only logged
    pub async fn delete(&self, url: &str) {
        let Some(key) = self.key_for(url) else {
            debug!("Skipping delete of foreign media URL {}", url);
            return;
        };

        if let Err(e) = self.storage.remove(key).await {
            warn!("Failed to delete media {}: {}", key, e);
        }
    }

    fn key_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty() && !key.split('/').any(|part| part == ".."))
    }

    async fn probe_duration(&self, bytes: &Bytes) -> Option<f64> {
        let path = std::env::temp_dir().join(format!("vidtube-probe-{}", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            warn!("Could not stage video for probing: {}", e);
            return None;
        }

        let duration = probe_file(&self.ffprobe_path, &path, PROBE_TIMEOUT).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove probe file {}: {}", path.display(), e);
        }
        duration
    }
}

async fn probe_file(ffprobe_path: &str, path: &Path, limit: Duration) -> Option<f64> {
    let run = Command::new(ffprobe_path)
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(limit, run).await {
        Ok(output) => output,
        Err(_) => {
            warn!("ffprobe timed out after {:?}", limit);
            return None;
        }
    };

    match output {
        Ok(output) if output.status.success() => {
            parse_duration(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            warn!("ffprobe failed with status: {:?}", output.status);
            None
        }
        Err(e) => {
            warn!("ffprobe unavailable: {}", e);
            None
        }
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}

fn object_key(kind: MediaKind, file_name: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}/{}.{}", kind.prefix(), Uuid::new_v4(), ext),
        None => format!("{}/{}", kind.prefix(), Uuid::new_v4()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(root: &Path) -> MediaService {
        MediaService::new(
            Arc::new(LocalMediaStorage::new(root)),
            "http://localhost:8000/media/",
            "ffprobe-that-does-not-exist",
        )
    }

    #[test]
    fn test_object_key_keeps_safe_extension() {
        let key = object_key(MediaKind::Image, Some("Avatar.PNG"));
        assert!(key.starts_with("images/"));
        assert!(key.ends_with(".png"));

        let key = object_key(MediaKind::Video, Some("../../etc/passwd"));
        assert!(key.starts_with("videos/"));
        assert!(!key.contains(".."));

        let key = object_key(MediaKind::Image, Some("archive.tar.gz;rm"));
        assert_eq!(key.matches('/').count(), 1);
        assert!(!key.contains(';'));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.480000\n"), Some(12.48));
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration("-3"), None);
    }

    #[tokio::test]
    async fn test_local_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let media = service(dir.path());

        let uploaded = media
            .upload(
                MediaFile {
                    file_name: Some("avatar.png".to_string()),
                    content_type: Some("image/png".to_string()),
                    bytes: Bytes::from_static(b"png-bytes"),
                },
                MediaKind::Image,
            )
            .await
            .unwrap();

        assert!(uploaded.url.starts_with("http://localhost:8000/media/images/"));
        assert_eq!(uploaded.duration, None);

        let key = media.key_for(&uploaded.url).unwrap().to_string();
        let path = dir.path().join(&key);
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");

        media.delete(&uploaded.url).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_video_without_ffprobe_has_no_duration() {
        let dir = tempfile::tempdir().unwrap();
        let media = service(dir.path());

        let uploaded = media
            .upload(
                MediaFile {
                    file_name: Some("clip.mp4".to_string()),
                    content_type: Some("video/mp4".to_string()),
                    bytes: Bytes::from_static(b"not really a video"),
                },
                MediaKind::Video,
            )
            .await
            .unwrap();

        assert!(uploaded.url.contains("/videos/"));
        assert_eq!(uploaded.duration, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_ffprobe_is_abandoned() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-ffprobe");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 10\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let started = std::time::Instant::now();
        let duration = probe_file(
            script.to_str().unwrap(),
            &dir.path().join("clip.mp4"),
            Duration::from_millis(200),
        )
        .await;

        assert_eq!(duration, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_foreign_urls_are_not_deleted() {
        let media = service(Path::new("/tmp"));
        assert_eq!(media.key_for("https://elsewhere.example/a.png"), None);
        assert_eq!(media.key_for("http://localhost:8000/media/../secret"), None);
        assert_eq!(
            media.key_for("http://localhost:8000/media/images/a.png"),
            Some("images/a.png")
        );
    }
}
