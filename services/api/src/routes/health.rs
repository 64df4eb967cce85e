//! Health check endpoint

use axum::extract::State;
use serde_json::{Value, json};

use crate::{
    error::{ApiError, ApiResult},
    response::ApiResponse,
    state::AppState,
};

/// Report whether the service and its store answer
pub async fn healthcheck(State(state): State<AppState>) -> ApiResult<ApiResponse<Value>> {
    state
        .repos
        .dashboard
        .ping()
        .await
        .map_err(ApiError::store("Health check failed"))?;

    Ok(ApiResponse::ok(
        json!({ "status": "ok", "service": "vidtube-api" }),
        "OK",
    ))
}
