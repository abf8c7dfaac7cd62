//! Ping / Health Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Ping endpoint - 存活检查
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub speakers: usize,
    pub tts_available: bool,
}

/// 健康检查：已注册说话人数与 TTS 后端可用性
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let speakers = state.registry.len().await;
    let tts_available = state.tts_engine.health_check().await;

    Json(ApiResponse::success(HealthResponse {
        status: if tts_available { "ok" } else { "degraded" },
        speakers,
        tts_available,
    }))
}
