//! File Speaker Store - 文件系统说话人存储实现
//!
//! 目录布局:
//! - `speakers.json`            名称 -> 记录 的 JSON 文档
//! - `audio/<slug>-<hash>-<uuid>.<ext>` 说话人的托管样本
//!
//! 所有写入都先落到同目录下的临时文件，fsync 后再 rename 到目标，
//! 读者永远看不到写了一半的文件。样本每次写入都使用新文件名，
//! 记录只有在映射保存成功后才会指向它。

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::application::ports::{SpeakerMap, SpeakerStorePort, StorageError};
use crate::domain::speaker::{AudioFormat, AudioSample, SpeakerName, SpeakerRecord};

const REGISTRY_FILE: &str = "speakers.json";
const AUDIO_DIR: &str = "audio";
/// 文件名中保留的名称前缀长度
const SLUG_MAX_CHARS: usize = 40;
/// 文件名中 MD5 前缀长度
const HASH_CHARS: usize = 12;

/// 文件系统说话人存储
pub struct FileSpeakerStore {
    base_dir: PathBuf,
    audio_dir: PathBuf,
    registry_file: PathBuf,
}

impl FileSpeakerStore {
    /// 创建存储，确保目录存在
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)
            .await
            .map_err(|e| StorageError::io(base_dir, e))?;
        // 记录中保存绝对路径，不受工作目录影响
        let base_dir = fs::canonicalize(base_dir)
            .await
            .map_err(|e| StorageError::io(base_dir, e))?;

        let audio_dir = base_dir.join(AUDIO_DIR);
        fs::create_dir_all(&audio_dir)
            .await
            .map_err(|e| StorageError::io(&audio_dir, e))?;

        Ok(Self {
            registry_file: base_dir.join(REGISTRY_FILE),
            audio_dir,
            base_dir,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn registry_file(&self) -> &Path {
        &self.registry_file
    }

    fn new_audio_path(&self, name: &SpeakerName, format: AudioFormat) -> PathBuf {
        self.audio_dir.join(format!(
            "{}-{}.{}",
            audio_file_stem(name),
            Uuid::new_v4().simple(),
            format.extension()
        ))
    }

    /// 托管目录中的所有文件（文件名，路径）
    async fn audio_files(&self) -> Result<Vec<(String, PathBuf)>, StorageError> {
        let mut entries = fs::read_dir(&self.audio_dir)
            .await
            .map_err(|e| StorageError::io(&self.audio_dir, e))?;
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.audio_dir, e))?
        {
            let file_name = entry.file_name().to_string_lossy().to_string();
            files.push((file_name, entry.path()));
        }
        Ok(files)
    }

    /// 损坏的文件移到一边保留现场
    async fn quarantine(&self) {
        let target = self.base_dir.join(format!(
            "{}.corrupt-{}",
            REGISTRY_FILE,
            chrono::Utc::now().timestamp()
        ));
        match fs::rename(&self.registry_file, &target).await {
            Ok(()) => tracing::warn!(
                path = %target.display(),
                "Corrupt speaker registry moved aside"
            ),
            Err(e) => tracing::error!(
                path = %self.registry_file.display(),
                error = %e,
                "Failed to move corrupt speaker registry aside"
            ),
        }
    }
}

/// 由名称确定性生成文件名主干
///
/// 非 `[A-Za-z0-9_-]` 字符替换为 `_`，再附加完整名称的 MD5 前缀，
/// 大小写不同或清洗后相同的名称不会落到同一个文件
pub fn audio_file_stem(name: &SpeakerName) -> String {
    let slug: String = name
        .as_str()
        .chars()
        .take(SLUG_MAX_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let digest = format!("{:x}", md5::compute(name.as_str().as_bytes()));
    format!("{}-{}", slug, &digest[..HASH_CHARS])
}

/// `<stem>-<uuid>.<ext>` 形式的文件属于该说话人
fn owned_by(file_name: &str, stem: &str) -> bool {
    let Some(rest) = file_name
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };
    match rest.split_once('.') {
        Some((id, ext)) => {
            Uuid::parse_str(id).is_ok() && AudioFormat::from_extension(ext).is_some()
        }
        None => false,
    }
}

fn is_temp_file(file_name: &str) -> bool {
    file_name.contains(".tmp-")
}

fn parse_registry(bytes: &[u8]) -> Result<SpeakerMap, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(SpeakerMap::new());
    }

    let raw: BTreeMap<String, SpeakerRecord> = serde_json::from_slice(bytes)?;
    let mut speakers = SpeakerMap::new();
    for (key, record) in raw {
        if key != record.name().as_str() {
            tracing::warn!(
                key = %key,
                speaker = %record.name(),
                "Skipping speaker entry whose key does not match its name"
            );
            continue;
        }
        speakers.insert(record.name().clone(), record);
    }
    Ok(speakers)
}

/// 临时文件 + fsync + rename
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{}.tmp-{}", file_name, Uuid::new_v4()));

    let result = async {
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        file.write_all(data)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    result
}

#[async_trait]
impl SpeakerStorePort for FileSpeakerStore {
    async fn load(&self) -> SpeakerMap {
        let bytes = match fs::read(&self.registry_file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.registry_file.display(),
                    "No speaker registry yet, starting empty"
                );
                return SpeakerMap::new();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.registry_file.display(),
                    error = %e,
                    "Failed to read speaker registry, starting empty"
                );
                return SpeakerMap::new();
            }
        };

        match parse_registry(&bytes) {
            Ok(speakers) => {
                tracing::debug!(count = speakers.len(), "Speaker registry loaded");
                speakers
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.registry_file.display(),
                    error = %e,
                    "Speaker registry is corrupt, starting empty"
                );
                self.quarantine().await;
                SpeakerMap::new()
            }
        }
    }

    async fn save(&self, speakers: &SpeakerMap) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(speakers)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        write_atomic(&self.registry_file, &json).await?;

        tracing::debug!(
            count = speakers.len(),
            size = json.len(),
            "Speaker registry saved"
        );
        Ok(())
    }

    async fn store_audio(
        &self,
        name: &SpeakerName,
        sample: &AudioSample,
    ) -> Result<PathBuf, StorageError> {
        let path = self.new_audio_path(name, sample.format());
        write_atomic(&path, sample.data()).await?;

        tracing::debug!(
            speaker = %name,
            path = %path.display(),
            size = sample.len(),
            "Stored speaker audio"
        );
        Ok(path)
    }

    fn locate_audio(&self, path: &Path) -> PathBuf {
        match path.file_name() {
            Some(file_name) => self.audio_dir.join(file_name),
            None => path.to_path_buf(),
        }
    }

    async fn delete_audio(&self, name: &SpeakerName) -> Result<(), StorageError> {
        let stem = audio_file_stem(name);
        let mut deleted = 0;
        for (file_name, path) in self.audio_files().await? {
            if owned_by(&file_name, &stem) {
                self.remove_file(&path).await?;
                deleted += 1;
            }
        }

        if deleted == 0 {
            tracing::debug!(speaker = %name, "No managed audio to delete");
        } else {
            tracing::debug!(speaker = %name, files = deleted, "Deleted speaker audio");
        }
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn sweep_audio(&self, speakers: &SpeakerMap) -> Result<usize, StorageError> {
        let referenced: HashSet<&Path> = speakers.values().map(|r| r.audio_path()).collect();
        let stems: Vec<String> = speakers.keys().map(audio_file_stem).collect();

        let mut removed = 0;
        for (file_name, path) in self.audio_files().await? {
            let stale = is_temp_file(&file_name)
                || (!referenced.contains(path.as_path())
                    && stems.iter().any(|stem| owned_by(&file_name, stem)));
            if stale {
                tracing::info!(path = %path.display(), "Removing stale speaker audio");
                self.remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
