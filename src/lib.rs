//! speakerd - 声音克隆说话人注册服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Speaker Context: 说话人记录、名称校验、参考音频
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeakerStore, AudioInspector, TtsEngine）
//! - Registry: 说话人注册表（唯一性、校验、原子持久化）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Persistence: JSON 文件存储
//! - Adapters: Symphonia 音频检查, HTTP TTS Client

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

pub use config::{load_config, AppConfig};
