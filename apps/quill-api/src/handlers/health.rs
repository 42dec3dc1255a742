//! 健康检查与认证指标。
//!
//! - GET /health
//! - GET /metrics（仅管理员）

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use quill_telemetry::metrics;

use crate::AppState;
use crate::middleware::require_admin_auth;
use crate::utils::response::ok;

/// 健康检查端点，无需认证
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// 认证计数快照
pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_admin_auth(&state, &headers).await {
        return response;
    }
    ok(StatusCode::OK, metrics().snapshot())
}
