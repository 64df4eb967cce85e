//! Request extractors that reject with the response envelope
//!
//! axum's own `Json`, `Query` and `Path` rejections are plain text; these
//! wrappers turn them into [`ApiError`] so malformed requests still get the
//! envelope.

use axum::{
    async_trait,
    extract::{
        FromRequest, FromRequestParts, Multipart, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{error::ApiError, media::MediaFile, models::PublicUser};

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// The user resolved by the auth middleware
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PublicUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))
    }
}

/// A buffered multipart form: text fields and non-empty files by field name
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, MediaFile>,
}

impl FormData {
    /// Trimmed text value, `None` when absent or blank
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn take_file(&mut self, name: &str) -> Option<MediaFile> {
        self.files.remove(name)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Fail with every missing text field and file named at once
    pub fn require(&self, texts: &[&str], files: &[&str]) -> Result<(), ApiError> {
        let missing: Vec<&str> = texts
            .iter()
            .filter(|name| self.text(name).is_none())
            .chain(files.iter().filter(|name| !self.has_file(name)))
            .copied()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::missing_fields(missing))
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    if bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        MediaFile {
                            file_name: Some(file_name),
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }
}

/// Check that every named value is present and non-blank
///
/// Returns the trimmed values in order, or a validation error naming all the
/// missing fields at once.
pub fn require_fields<const N: usize>(
    fields: [(&str, Option<String>); N],
) -> Result<[String; N], ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing));
    }

    Ok(fields.map(|(_, value)| value.unwrap_or_default().trim().to_string()))
}

/// Parse an identifier-shaped value
pub fn parse_id(field: &str, value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::invalid_field(field, format!("Invalid {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_fields_reports_every_missing_field() {
        let result = require_fields([
            ("title", Some("  ".to_string())),
            ("description", None),
            ("name", Some("ok".to_string())),
        ]);

        match result {
            Err(ApiError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["title", "description"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_require_fields_trims_values() {
        let [content] = require_fields([("content", Some("  hello ".to_string()))]).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id("videoId", &id.to_string()).unwrap(), id);

        match parse_id("videoId", "not-an-id") {
            Err(ApiError::Validation { fields, message }) => {
                assert_eq!(fields, vec!["videoId"]);
                assert_eq!(message, "Invalid videoId");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
