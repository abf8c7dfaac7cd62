//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait，两步调用外部声音克隆服务:
//! 1. POST {base_url}/synthesize
//!    Request:  {"text": "...", "language": "pt", "speaker_wav": "/path/sample.wav", "output_format": "wav"}
//!    Response: {"success": true, "audio_file": "speech_xxx.wav", "error": null}
//! 2. GET {base_url}/audio/get/{audio_file} -> audio/wav binary

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    /// 参考音频路径（TTS 服务与本服务共享文件系统）
    speaker_wav: String,
    output_format: &'static str,
}

/// 合成响应体 (JSON)
#[derive(Debug, Deserialize)]
struct TtsHttpResponse {
    success: bool,
    #[serde(default)]
    audio_file: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 网络错误时的重试次数
    pub max_retries: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    base: Url,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| TtsError::InvalidConfig(format!("Bad TTS URL {}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(TtsError::InvalidConfig(format!(
                "Bad TTS URL {}: not a base URL",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// 在基础 URL 后追加路径段，每段单独做百分号编码
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn synthesize_url(&self) -> Url {
        self.endpoint(&["synthesize"])
    }

    /// 后端返回的文件名只能作为单个路径段
    fn audio_url(&self, audio_file: &str) -> Result<Url, TtsError> {
        if audio_file.is_empty()
            || audio_file == "."
            || audio_file == ".."
            || audio_file.contains(['/', '\\'])
        {
            return Err(TtsError::InvalidResponse(format!(
                "Unusable audio file name: {:?}",
                audio_file
            )));
        }
        Ok(self.endpoint(&["audio", "get", audio_file]))
    }

    fn health_url(&self) -> Url {
        self.endpoint(&["health"])
    }

    async fn synthesize_once(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, TtsError> {
        let body = TtsHttpRequest {
            text: &request.text,
            language: request.language.as_deref(),
            speaker_wav: request.speaker_wav.to_string_lossy().to_string(),
            output_format: "wav",
        };

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let result: TtsHttpResponse = response
            .json()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Bad synthesis response: {}", e)))?;

        let audio_file = match (result.success, result.audio_file) {
            (true, Some(file)) => file,
            (_, _) => {
                return Err(TtsError::ServiceError(
                    result
                        .error
                        .unwrap_or_else(|| "synthesis reported no audio file".to_string()),
                ))
            }
        };

        let audio = self
            .client
            .get(self.audio_url(&audio_file)?)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = audio.status();
        if !status.is_success() {
            return Err(TtsError::ServiceError(format!(
                "HTTP {} fetching {}",
                status, audio_file
            )));
        }

        let headers = audio.headers();
        let duration_ms = headers
            .get("X-TTS-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let sample_rate = headers
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = audio
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        Ok(SynthesisResponse {
            audio_data,
            duration_ms,
            sample_rate,
        })
    }
}

fn map_send_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

fn is_retryable(err: &TtsError) -> bool {
    matches!(err, TtsError::NetworkError(_) | TtsError::Timeout)
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        tracing::debug!(
            url = %self.synthesize_url(),
            speaker = %request.speaker,
            text_len = request.text.len(),
            language = ?request.language,
            "Sending TTS synthesis request"
        );

        let mut attempt = 0;
        loop {
            match self.synthesize_once(&request).await {
                Ok(response) => {
                    tracing::info!(
                        speaker = %request.speaker,
                        duration_ms = ?response.duration_ms,
                        audio_size = response.audio_data.len(),
                        "TTS synthesis completed"
                    );
                    return Ok(response);
                }
                Err(e) if is_retryable(&e) && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        speaker = %request.speaker,
                        attempt,
                        error = %e,
                        "TTS request failed, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
