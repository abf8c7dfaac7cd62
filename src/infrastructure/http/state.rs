//! Application State
//!
//! 请求处理器共享的注册表与 TTS 端口

use std::sync::Arc;

use crate::application::{SpeakerRegistry, TtsEnginePort};

/// 应用状态
pub struct AppState {
    pub registry: Arc<SpeakerRegistry>,
    pub tts_engine: Arc<dyn TtsEnginePort>,
    /// 请求和说话人都未指定语言时的合成语言
    pub default_language: String,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        registry: Arc<SpeakerRegistry>,
        tts_engine: Arc<dyn TtsEnginePort>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            tts_engine,
            default_language: default_language.into(),
        }
    }
}
