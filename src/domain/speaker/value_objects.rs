//! Speaker Context - Value Objects

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::SpeakerError;

/// 名称最大长度（字符）
const MAX_NAME_CHARS: usize = 100;

/// 说话人名称
///
/// 不变量:
/// - 去除首尾空白后不能为空
/// - 不超过 100 个字符，不含控制字符
/// - 大小写敏感，原样保存
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpeakerName(String);

impl SpeakerName {
    pub fn new(name: impl Into<String>) -> Result<Self, SpeakerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SpeakerError::InvalidName(
                "name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(SpeakerError::InvalidName(format!(
                "name must not exceed {} characters",
                MAX_NAME_CHARS
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(SpeakerError::InvalidName(
                "name must not contain control characters".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SpeakerName {
    type Error = SpeakerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::borrow::Borrow<str> for SpeakerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<SpeakerName> for String {
    fn from(name: SpeakerName) -> Self {
        name.0
    }
}

impl std::fmt::Display for SpeakerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 扩展属性值
///
/// 调用方提供的任意元数据（年龄、口音等），只允许字符串或数字
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(serde_json::Number),
}

impl PropertyValue {
    /// 从 JSON 值转换，拒绝布尔、null、数组和对象
    pub fn from_json(key: &str, value: serde_json::Value) -> Result<Self, SpeakerError> {
        match value {
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            serde_json::Value::Number(n) => Ok(Self::Number(n)),
            other => Err(SpeakerError::InvalidProperty {
                key: key.to_string(),
                reason: format!("expected string or number, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// 音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 4] = [Self::Wav, Self::Mp3, Self::Flac, Self::Ogg];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
        }
    }
}

/// 上传的参考音频样本（尚未落盘）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSample {
    data: Vec<u8>,
    format: AudioFormat,
}

impl AudioSample {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    /// 根据上传文件名推断格式，无扩展名时按 WAV 处理
    pub fn from_upload(data: Vec<u8>, file_name: Option<&str>) -> Result<Self, SpeakerError> {
        let format = match file_name.and_then(|f| Path::new(f).extension()) {
            None => AudioFormat::Wav,
            Some(ext) => ext
                .to_str()
                .and_then(AudioFormat::from_extension)
                .ok_or_else(|| {
                    SpeakerError::InvalidAudio(
                        "only WAV, MP3, FLAC, OGG audio files are allowed".to_string(),
                    )
                })?,
        };
        Ok(Self { data, format })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
