//! Persistence Layer - 数据持久化
//!
//! 说话人注册表的文件存储实现

mod file_store;

pub use file_store::{audio_file_stem, FileSpeakerStore};
