//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::speaker::{PropertyValue, SpeakerRecord};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Speaker DTOs
// ============================================================================

/// 按名称定位说话人（get / delete）
#[derive(Debug, Deserialize)]
pub struct SpeakerNameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SpeakerResponse {
    pub name: String,
    pub audio_path: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub extra_properties: BTreeMap<String, PropertyValue>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SpeakerRecord> for SpeakerResponse {
    fn from(record: SpeakerRecord) -> Self {
        Self {
            name: record.name().to_string(),
            audio_path: record.audio_path().display().to_string(),
            language: record.language().map(str::to_string),
            description: record.description().map(str::to_string),
            extra_properties: record.extra_properties().clone(),
            created_at: record.created_at().to_rfc3339(),
            updated_at: record.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SpeakerListResponse {
    pub speakers: Vec<SpeakerResponse>,
    pub total: usize,
}

// ============================================================================
// Synthesis DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    pub speaker: String,
    #[serde(default)]
    pub language: Option<String>,
}
