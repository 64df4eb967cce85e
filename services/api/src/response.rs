//! Uniform response envelope
//!
//! Every response, success or failure, is serialised as
//! `{ statusCode, success, message, data, errors? }`. Handlers return
//! `Result<ApiResponse<T>, ApiError>` and both sides render through
//! [`Envelope`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Wire shape shared by every response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            success: status.as_u16() < 400,
            message: message.into(),
            data,
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Successful handler output
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    pub fn with_status(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope::new(self.status, self.message, self.data);
        (self.status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_is_derived_from_status() {
        let ok = Envelope::new(StatusCode::CREATED, "made", json!({ "id": 1 }));
        assert!(ok.success);
        assert_eq!(ok.status_code, 201);

        let failed = Envelope::new(StatusCode::NOT_FOUND, "missing", json!(null));
        assert!(!failed.success);
    }

    #[test]
    fn test_envelope_wire_shape() {
        let value = serde_json::to_value(Envelope::new(StatusCode::OK, "fine", vec![1, 2])).unwrap();
        assert_eq!(
            value,
            json!({ "statusCode": 200, "success": true, "message": "fine", "data": [1, 2] })
        );

        let value = serde_json::to_value(
            Envelope::new(StatusCode::BAD_REQUEST, "bad", json!({ "error": "bad" }))
                .with_errors(vec!["title".to_string()]),
        )
        .unwrap();
        assert_eq!(value["errors"], json!(["title"]));
    }

    #[tokio::test]
    async fn test_api_response_sets_status() {
        let response = ApiResponse::created(json!({ "id": "abc" }), "Created").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope.data["id"], "abc");
        assert_eq!(envelope.message, "Created");
    }
}
