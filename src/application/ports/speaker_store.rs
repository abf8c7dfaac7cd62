//! Speaker Store Port - 出站端口
//!
//! 说话人记录与参考音频的持久化抽象。
//! 整个映射表一次性读写，具体实现在 infrastructure/persistence 层

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::speaker::{AudioSample, SpeakerName, SpeakerRecord};

/// 名称 -> 记录 的完整映射
pub type SpeakerMap = BTreeMap<SpeakerName, SpeakerRecord>;

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Speaker Store Port
#[async_trait]
pub trait SpeakerStorePort: Send + Sync {
    /// 读取当前映射；数据缺失或损坏时返回空映射，不报错
    async fn load(&self) -> SpeakerMap;

    /// 原子地持久化完整映射（先写临时文件，再原子替换）
    async fn save(&self, speakers: &SpeakerMap) -> Result<(), StorageError>;

    /// 写入音频到一个新的唯一托管路径并返回；从不覆盖已有文件
    async fn store_audio(
        &self,
        name: &SpeakerName,
        sample: &AudioSample,
    ) -> Result<PathBuf, StorageError>;

    /// 同名文件在当前托管目录中的位置（数据目录搬迁后修复记录路径）
    fn locate_audio(&self, path: &Path) -> PathBuf;

    /// 删除说话人的所有托管音频；文件不存在时只记录日志
    async fn delete_audio(&self, name: &SpeakerName) -> Result<(), StorageError>;

    /// 删除指定托管文件；文件不存在时忽略
    async fn remove_file(&self, path: &Path) -> Result<(), StorageError>;

    /// 清理残留的临时文件，以及属于已知说话人但未被记录引用的样本；返回删除数量
    async fn sweep_audio(&self, speakers: &SpeakerMap) -> Result<usize, StorageError>;
}
