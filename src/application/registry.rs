//! Speaker Registry - 说话人注册表
//!
//! 负责名称唯一性与输入校验，并把每次变更编排成
//! "读取当前映射 -> 应用一次逻辑变更 -> 持久化完整映射" 的原子步骤。
//!
//! 所有写操作在同一把写锁内串行执行，每次写操作恰好调用一次 `save`；
//! 新映射只有在 `save` 成功后才对读者可见。写操作在独立任务中执行，
//! 调用方放弃等待（例如客户端断开）时变更仍会完整结束。

use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::commands::{DeleteSpeaker, RegisterSpeaker, UpdateSpeaker};
use crate::application::error::{Operation, RegistryError};
use crate::application::ports::{AudioInspectorPort, SpeakerMap, SpeakerStorePort, StorageError};
use crate::application::queries::{GetSpeaker, ListSpeakers};
use crate::domain::speaker::{
    AudioFormat, AudioSample, SpeakerName, SpeakerPatch, SpeakerRecord,
};

/// 注册表配置
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// 参考音频最小字节数
    pub min_sample_bytes: usize,
    /// 参考音频最大字节数
    pub max_sample_bytes: usize,
    /// 启动时修复缺失样本用的备用音频
    pub fallback_sample: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_sample_bytes: 1024,
            max_sample_bytes: 10 * 1024 * 1024,
            fallback_sample: None,
        }
    }
}

/// 说话人注册表
///
/// 每个进程构造一次，以 `Arc<SpeakerRegistry>` 传给请求处理器
pub struct SpeakerRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    store: Arc<dyn SpeakerStorePort>,
    inspector: Arc<dyn AudioInspectorPort>,
    config: RegistryConfig,
    speakers: RwLock<SpeakerMap>,
}

impl SpeakerRegistry {
    /// 加载已持久化的映射，修复缺失样本的记录并清理残留音频
    pub async fn open(
        store: Arc<dyn SpeakerStorePort>,
        inspector: Arc<dyn AudioInspectorPort>,
        config: RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let mut speakers = store.load().await;

        if reconcile(store.as_ref(), &config, &mut speakers).await {
            store
                .save(&speakers)
                .await
                .map_err(|e| RegistryError::storage(Operation::Open, None, e))?;
        }

        match store.sweep_audio(&speakers).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(files = removed, "Removed stale speaker audio"),
            Err(e) => tracing::warn!(error = %e, "Failed to sweep speaker audio"),
        }

        tracing::info!(speakers = speakers.len(), "Speaker registry opened");

        Ok(Self {
            inner: Arc::new(RegistryInner {
                store,
                inspector,
                config,
                speakers: RwLock::new(speakers),
            }),
        })
    }

    /// 注册新说话人
    pub async fn register(&self, command: RegisterSpeaker) -> Result<SpeakerRecord, RegistryError> {
        let inner = self.inner.clone();
        run_to_completion(Operation::Register, async move { inner.register(command).await }).await
    }

    /// 部分更新说话人
    pub async fn update(&self, command: UpdateSpeaker) -> Result<SpeakerRecord, RegistryError> {
        let inner = self.inner.clone();
        run_to_completion(Operation::Update, async move { inner.update(command).await }).await
    }

    /// 删除说话人及其音频
    pub async fn delete(&self, command: DeleteSpeaker) -> Result<(), RegistryError> {
        let inner = self.inner.clone();
        run_to_completion(Operation::Delete, async move { inner.delete(command).await }).await
    }

    pub async fn get(&self, query: GetSpeaker) -> Result<SpeakerRecord, RegistryError> {
        self.inner
            .speakers
            .read()
            .await
            .get(query.name.as_str())
            .cloned()
            .ok_or_else(|| RegistryError::not_found(Operation::Get, query.name))
    }

    /// 按名称排序返回所有记录
    pub async fn list_all(&self, _query: ListSpeakers) -> Vec<SpeakerRecord> {
        self.inner.speakers.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.speakers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.speakers.read().await.is_empty()
    }
}

/// 在独立任务中执行写操作并等待结果
///
/// 丢弃返回的 future 不会取消任务，`store -> save -> swap` 不会停在中间
async fn run_to_completion<T, F>(op: Operation, mutation: F) -> Result<T, RegistryError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, RegistryError>> + Send + 'static,
{
    match tokio::spawn(mutation).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            tracing::error!(operation = %op, error = %e, "Speaker mutation did not complete");
            Err(RegistryError::Interrupted { operation: op })
        }
    }
}

impl RegistryInner {
    async fn register(&self, command: RegisterSpeaker) -> Result<SpeakerRecord, RegistryError> {
        let op = Operation::Register;
        let name = SpeakerName::new(command.name.clone())
            .map_err(|e| RegistryError::invalid(op, &command.name, e))?;
        let sample = command
            .audio
            .ok_or_else(|| RegistryError::validation(op, name.as_str(), "audio sample is required"))?;
        self.validate_sample(op, &name, &sample)?;

        let mut speakers = self.speakers.write().await;
        if speakers.contains_key(&name) {
            return Err(RegistryError::duplicate(op, name.as_str()));
        }

        let audio_path = self
            .store
            .store_audio(&name, &sample)
            .await
            .map_err(|e| self.storage_failure(op, &name, e))?;

        let record = SpeakerRecord::new(name.clone(), audio_path.clone(), Utc::now())
            .with_language(command.language)
            .with_description(command.description)
            .with_extra_properties(command.extra_properties);

        let mut next = speakers.clone();
        next.insert(name.clone(), record.clone());

        if let Err(e) = self.store.save(&next).await {
            self.discard_file(&audio_path).await;
            return Err(self.storage_failure(op, &name, e));
        }
        *speakers = next;

        tracing::info!(
            speaker = %name,
            path = %audio_path.display(),
            "Speaker registered"
        );

        Ok(record)
    }

    async fn update(&self, command: UpdateSpeaker) -> Result<SpeakerRecord, RegistryError> {
        let op = Operation::Update;
        if let Some(sample) = &command.audio {
            // 样本不合法时在任何存储变更之前中止
            let name = SpeakerName::new(command.name.clone())
                .map_err(|e| RegistryError::invalid(op, &command.name, e))?;
            self.validate_sample(op, &name, sample)?;
        }

        let mut speakers = self.speakers.write().await;
        let current = speakers
            .get(command.name.as_str())
            .cloned()
            .ok_or_else(|| RegistryError::not_found(op, &command.name))?;
        let name = current.name().clone();

        let mut patch = SpeakerPatch {
            audio_path: None,
            language: command.language,
            description: command.description,
            extra_properties: command.extra_properties,
        };

        // 新样本写到新文件，旧文件在 save 成功前保持不动
        let stored = match &command.audio {
            Some(sample) => Some(
                self.store
                    .store_audio(&name, sample)
                    .await
                    .map_err(|e| self.storage_failure(op, &name, e))?,
            ),
            None => None,
        };
        patch.audio_path = stored.clone();

        let mut record = current.clone();
        record.apply(patch, Utc::now());

        let mut next = speakers.clone();
        next.insert(name.clone(), record.clone());

        if let Err(e) = self.store.save(&next).await {
            if let Some(stored) = &stored {
                self.discard_file(stored).await;
            }
            return Err(self.storage_failure(op, &name, e));
        }
        *speakers = next;

        if stored.is_some() {
            self.discard_file(current.audio_path()).await;
        }

        tracing::info!(
            speaker = %name,
            audio_replaced = stored.is_some(),
            "Speaker updated"
        );

        Ok(record)
    }

    async fn delete(&self, command: DeleteSpeaker) -> Result<(), RegistryError> {
        let op = Operation::Delete;
        let mut speakers = self.speakers.write().await;
        let record = speakers
            .get(command.name.as_str())
            .cloned()
            .ok_or_else(|| RegistryError::not_found(op, &command.name))?;
        let name = record.name().clone();

        let mut next = speakers.clone();
        next.remove(&name);

        self.store
            .save(&next)
            .await
            .map_err(|e| self.storage_failure(op, &name, e))?;
        *speakers = next;

        // 记录已移除，音频清理失败只影响磁盘占用
        if let Err(e) = self.store.delete_audio(&name).await {
            tracing::error!(speaker = %name, error = %e, "Failed to delete speaker audio");
        }
        self.discard_file(record.audio_path()).await;

        tracing::info!(speaker = %name, "Speaker deleted");

        Ok(())
    }

    fn validate_sample(
        &self,
        op: Operation,
        name: &SpeakerName,
        sample: &AudioSample,
    ) -> Result<(), RegistryError> {
        if sample.is_empty() {
            return Err(RegistryError::validation(op, name.as_str(), "audio sample is empty"));
        }
        if sample.len() < self.config.min_sample_bytes {
            return Err(RegistryError::validation(
                op,
                name.as_str(),
                format!(
                    "audio sample too small: {} bytes (minimum {})",
                    sample.len(),
                    self.config.min_sample_bytes
                ),
            ));
        }
        if sample.len() > self.config.max_sample_bytes {
            return Err(RegistryError::validation(
                op,
                name.as_str(),
                format!(
                    "audio sample too large: {} bytes (maximum {})",
                    sample.len(),
                    self.config.max_sample_bytes
                ),
            ));
        }

        let info = self
            .inspector
            .inspect(sample)
            .map_err(|e| RegistryError::validation(op, name.as_str(), e.to_string()))?;

        tracing::debug!(
            speaker = %name,
            format = ?info.format,
            sample_rate = ?info.sample_rate,
            duration_ms = ?info.duration_ms,
            "Audio sample accepted"
        );

        Ok(())
    }

    fn storage_failure(&self, op: Operation, name: &SpeakerName, source: StorageError) -> RegistryError {
        tracing::error!(
            operation = %op,
            speaker = %name,
            error = %source,
            "Speaker storage failure"
        );
        RegistryError::storage(op, Some(name.to_string()), source)
    }

    async fn discard_file(&self, path: &Path) {
        if let Err(e) = self.store.remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove audio file");
        }
    }
}

/// 修复缺失或为空的参考音频；返回映射是否有变化
///
/// 先在当前托管目录中按文件名查找（数据目录整体搬迁过），
/// 找不到再用备用音频，都没有则丢弃该记录
async fn reconcile(
    store: &dyn SpeakerStorePort,
    config: &RegistryConfig,
    speakers: &mut SpeakerMap,
) -> bool {
    let mut changed = false;
    let names: Vec<SpeakerName> = speakers.keys().cloned().collect();

    for name in names {
        let Some(record) = speakers.get_mut(&name) else {
            continue;
        };
        if sample_present(record.audio_path()).await {
            tracing::debug!(speaker = %name, path = %record.audio_path().display(), "Speaker ready");
            continue;
        }

        let located = store.locate_audio(record.audio_path());
        if located.as_path() != record.audio_path() && sample_present(&located).await {
            tracing::info!(
                speaker = %name,
                from = %record.audio_path().display(),
                to = %located.display(),
                "Speaker sample relocated"
            );
            record.relocate_audio(located);
            changed = true;
            continue;
        }

        tracing::warn!(
            speaker = %name,
            path = %record.audio_path().display(),
            "Speaker sample missing"
        );

        match restore_from_fallback(store, config, &name).await {
            Some(path) => {
                tracing::info!(speaker = %name, path = %path.display(), "Fallback sample restored");
                record.relocate_audio(path);
            }
            None => {
                tracing::warn!(speaker = %name, "Dropping speaker without a usable sample");
                speakers.remove(&name);
            }
        }
        changed = true;
    }

    changed
}

async fn sample_present(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

async fn restore_from_fallback(
    store: &dyn SpeakerStorePort,
    config: &RegistryConfig,
    name: &SpeakerName,
) -> Option<PathBuf> {
    let fallback = config.fallback_sample.as_ref()?;
    let bytes = match tokio::fs::read(fallback).await {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            tracing::warn!(path = %fallback.display(), "Fallback sample is empty");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %fallback.display(), error = %e, "Fallback sample unreadable");
            return None;
        }
    };
    let format = AudioFormat::from_path(fallback).unwrap_or_default();

    match store.store_audio(name, &AudioSample::new(bytes, format)).await {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::error!(speaker = %name, error = %e, "Failed to copy fallback sample");
            None
        }
    }
}
