//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_inspector;
mod speaker_store;
mod tts_engine;

pub use audio_inspector::{AudioInfo, AudioInspectorPort, InspectError};
pub use speaker_store::{SpeakerMap, SpeakerStorePort, StorageError};
pub use tts_engine::{SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError};
