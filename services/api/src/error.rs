//! Error types for the API service
//!
//! `ApiError` is the failure half of every handler result. It renders as the
//! response envelope with `data = { "error": detail }` and attaches an
//! [`ErrorTrace`] extension that the error boundary exposes outside
//! production.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{media::MediaError, repositories::StoreError, response::Envelope};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{message}")]
    Validation { message: String, fields: Vec<String> },

    /// Well-formed input that cannot be acted upon
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired credential
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not the owner
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violated
    #[error("{0}")]
    Conflict(String),

    /// Persistence operation failed
    #[error("{context}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// Media upload failed
    #[error("{context}")]
    Media {
        context: &'static str,
        #[source]
        source: MediaError,
    },

    /// Anything else
    #[error("Something went wrong")]
    Unexpected(#[from] anyhow::Error),
}

/// Source chain of an error response, attached as a response extension
#[derive(Debug, Clone)]
pub struct ErrorTrace(pub Vec<String>);

impl ApiError {
    /// Validation failure for a list of missing or malformed fields
    pub fn missing_fields(fields: Vec<&str>) -> Self {
        let fields: Vec<String> = fields.into_iter().map(str::to_string).collect();
        ApiError::Validation {
            message: format!("{} is required", fields.join(", ")),
            fields,
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            fields: vec![field.to_string()],
        }
    }

    /// Map a store failure, logging it where it is converted
    ///
    /// Used as `.map_err(ApiError::store("Failed to create video"))`.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| match source {
            StoreError::Conflict(message) => ApiError::Conflict(message),
            source => {
                error!("{}: {}", context, source);
                ApiError::Store { context, source }
            }
        }
    }

    /// Map a media failure, logging it where it is converted
    pub fn media(context: &'static str) -> impl FnOnce(MediaError) -> ApiError {
        move |source| {
            error!("{}: {}", context, source);
            ApiError::Media { context, source }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Store { .. } | ApiError::Media { .. } | ApiError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn trace(&self) -> Vec<String> {
        let mut trace = vec![format!("{:?}", self)];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            trace.push(err.to_string());
            source = err.source();
        }
        trace
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Unexpected(err) = &self {
            error!("Unexpected error: {:#}", err);
        }

        let message = self.to_string();
        let trace = ErrorTrace(self.trace());

        let mut envelope = Envelope::new(status, message.clone(), json!({ "error": message }));
        if let ApiError::Validation { fields, .. } = self {
            envelope = envelope.with_errors(fields);
        }

        let mut response = (status, Json(envelope)).into_response();
        response.extensions_mut().insert(trace);
        response
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vidtube_common::error::DatabaseError;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let response = ApiError::missing_fields(vec!["title", "description"]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "title, description is required");
        assert_eq!(json["data"]["error"], "title, description is required");
        assert_eq!(json["errors"], json!(["title", "description"]));
    }

    #[tokio::test]
    async fn test_store_conflict_becomes_409() {
        let err = ApiError::store("Failed to create user")(StoreError::Conflict(
            "User with email or username already exists".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(body(response).await.get("errors").is_none());
    }

    #[test]
    fn test_store_failure_carries_trace() {
        let err = ApiError::store("Failed to fetch video")(StoreError::Database(
            DatabaseError::Migration("boom".to_string()),
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        let trace = response.extensions().get::<ErrorTrace>().unwrap();
        assert!(trace.0.iter().any(|line| line.contains("boom")));
    }
}
