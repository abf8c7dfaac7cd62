//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeakerStore、AudioInspector、TtsEngine）
//! - commands / queries: 注册表的写、读请求
//! - registry: 说话人注册表
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod registry;

// Re-exports
pub use commands::{DeleteSpeaker, RegisterSpeaker, UpdateSpeaker};
pub use error::{Operation, RegistryError};
pub use ports::{
    AudioInfo, AudioInspectorPort, InspectError, SpeakerMap, SpeakerStorePort, StorageError,
    SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError,
};
pub use queries::{GetSpeaker, ListSpeakers};
pub use registry::{RegistryConfig, SpeakerRegistry};
