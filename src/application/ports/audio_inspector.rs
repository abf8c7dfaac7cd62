//! Audio Inspector Port - 参考音频校验
//!
//! 在写入存储之前确认上传的样本可以被解码

use thiserror::Error;

use crate::domain::speaker::{AudioFormat, AudioSample};

/// 音频探测错误
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Unreadable audio: {0}")]
    Unreadable(String),

    #[error("No audio track found")]
    NoAudioTrack,
}

/// 音频基本信息
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub format: AudioFormat,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    /// 时长（毫秒），容器未声明帧数时为 None
    pub duration_ms: Option<u64>,
}

/// Audio Inspector Port
pub trait AudioInspectorPort: Send + Sync {
    fn inspect(&self, sample: &AudioSample) -> Result<AudioInfo, InspectError>;
}
