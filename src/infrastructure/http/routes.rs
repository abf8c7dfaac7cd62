//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                  GET   存活检查
//! - /api/health                GET   注册表与 TTS 后端状态
//! - /api/speaker/register      POST  注册说话人（multipart）
//! - /api/speaker/update        POST  更新说话人（multipart）
//! - /api/speaker/delete        POST  删除说话人
//! - /api/speaker/get           POST  获取说话人详情
//! - /api/speaker/list          GET   列出所有说话人
//! - /api/speaker/audio/{name}  GET   下载参考音频
//! - /api/synthesize            POST  使用说话人合成语音

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .nest("/speaker", speaker_routes())
        .route("/synthesize", post(handlers::synthesize))
}

/// Speaker 路由
fn speaker_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(handlers::register_speaker))
        .route("/update", post(handlers::update_speaker))
        .route("/delete", post(handlers::delete_speaker))
        .route("/get", post(handlers::get_speaker))
        .route("/list", get(handlers::list_speakers))
        .route("/audio/:name", get(handlers::download_speaker_audio))
}
