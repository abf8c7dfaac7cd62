//! Synthesis Handler
//!
//! 使用已注册说话人的参考音频调用外部 TTS 后端

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::application::{GetSpeaker, SynthesisRequest};
use crate::infrastructure::http::dto::SynthesizeRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 合成语音，返回 audio/wav
///
/// 语言优先级：请求 > 说话人 > 默认语言
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text must not be empty".to_string()));
    }

    let record = state
        .registry
        .get(GetSpeaker {
            name: req.speaker.clone(),
        })
        .await?;

    let language = req
        .language
        .filter(|l| !l.trim().is_empty())
        .or_else(|| record.language().map(str::to_string))
        .unwrap_or_else(|| state.default_language.clone());

    let result = state
        .tts_engine
        .synthesize(SynthesisRequest {
            text: req.text,
            speaker: record.name().to_string(),
            speaker_wav: record.audio_path().to_path_buf(),
            language: Some(language),
        })
        .await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, result.audio_data.len());
    if let Some(duration_ms) = result.duration_ms {
        builder = builder.header("X-TTS-Duration-Ms", duration_ms);
    }
    if let Some(sample_rate) = result.sample_rate {
        builder = builder.header("X-TTS-Sample-Rate", sample_rate);
    }

    builder
        .body(Body::from(result.audio_data))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    use crate::application::RegisterSpeaker;
    use crate::infrastructure::http::{build_router, AppState};
    use crate::test_support::{app_state, wav_bytes, wav_sample, StubTtsEngine};

    fn synthesize_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/synthesize")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn setup(dir: &TempDir, tts: Arc<StubTtsEngine>) -> (Router, Arc<AppState>) {
        let (state, _) = app_state(dir.path(), tts).await;
        state
            .registry
            .register(RegisterSpeaker {
                name: "joana".to_string(),
                audio: Some(wav_sample(2)),
                language: Some("pt".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        state
            .registry
            .register(RegisterSpeaker {
                name: "sem-lingua".to_string(),
                audio: Some(wav_sample(2)),
                ..Default::default()
            })
            .await
            .unwrap();
        (build_router(state.clone(), 1024 * 1024), state)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_returns_wav_and_uses_speaker_sample() {
        let dir = TempDir::new().unwrap();
        let tts = Arc::new(StubTtsEngine::default());
        let (app, state) = setup(&dir, tts.clone()).await;

        let response = app
            .oneshot(synthesize_request(json!({"text": "olá mundo", "speaker": "joana"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
        assert_eq!(response.headers()["X-TTS-Duration-Ms"], "1000");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.to_vec(), wav_bytes(1));

        let record = state
            .registry
            .get(crate::application::GetSpeaker {
                name: "joana".to_string(),
            })
            .await
            .unwrap();
        let requests = tts.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].speaker_wav, record.audio_path());
        assert_eq!(requests[0].language.as_deref(), Some("pt"));
    }

    #[tokio::test]
    async fn test_language_resolution() {
        let dir = TempDir::new().unwrap();
        let tts = Arc::new(StubTtsEngine::default());
        let (app, _) = setup(&dir, tts.clone()).await;

        app.clone()
            .oneshot(synthesize_request(
                json!({"text": "hello", "speaker": "joana", "language": "en"}),
            ))
            .await
            .unwrap();
        app.oneshot(synthesize_request(json!({"text": "olá", "speaker": "sem-lingua"})))
            .await
            .unwrap();

        let requests = tts.requests();
        assert_eq!(requests[0].language.as_deref(), Some("en"));
        // 说话人未设置语言时使用默认语言
        assert_eq!(requests[1].language.as_deref(), Some("pt"));
    }

    #[tokio::test]
    async fn test_synthesize_errors() {
        let dir = TempDir::new().unwrap();
        let (app, _) = setup(&dir, Arc::new(StubTtsEngine::default())).await;

        let response = app
            .clone()
            .oneshot(synthesize_request(json!({"text": "  ", "speaker": "joana"})))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["errno"], 400);

        let response = app
            .oneshot(synthesize_request(json!({"text": "olá", "speaker": "maria"})))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["errno"], 404);
    }

    #[tokio::test]
    async fn test_backend_failure_is_service_unavailable() {
        let dir = TempDir::new().unwrap();
        let (app, _) = setup(&dir, Arc::new(StubTtsEngine::unavailable())).await;

        let response = app
            .clone()
            .oneshot(synthesize_request(json!({"text": "olá", "speaker": "joana"})))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["errno"], 503);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["speakers"], 2);
        assert_eq!(body["data"]["tts_available"], false);
        assert_eq!(body["data"]["status"], "degraded");
    }
}
