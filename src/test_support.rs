//! 测试辅助：生成 WAV 样本、可注入故障的存储

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::ports::{
    SpeakerMap, SpeakerStorePort, StorageError, SynthesisRequest, SynthesisResponse,
    TtsEnginePort, TtsError,
};
use crate::application::registry::{RegistryConfig, SpeakerRegistry};
use crate::domain::speaker::{AudioFormat, AudioSample, SpeakerName};
use crate::infrastructure::adapters::SymphoniaAudioInspector;
use crate::infrastructure::http::AppState;
use crate::infrastructure::persistence::FileSpeakerStore;

const SAMPLE_RATE: u32 = 16_000;

/// 16-bit 单声道 PCM WAV，内容为简单的锯齿波
pub fn wav_bytes(seconds: u32) -> Vec<u8> {
    let frames = SAMPLE_RATE * seconds;
    let data_len = frames * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for i in 0..frames {
        let sample = ((i % 200) as i16 - 100) * 100;
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

pub fn wav_sample(seconds: u32) -> AudioSample {
    AudioSample::new(wav_bytes(seconds), AudioFormat::Wav)
}

/// 包装真实文件存储，统计 save 次数，可让 save 失败或变慢
pub struct FlakyStore {
    inner: FileSpeakerStore,
    fail_saves: AtomicBool,
    save_delay_ms: AtomicU64,
    saves: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: FileSpeakerStore) -> Self {
        Self {
            inner,
            fail_saves: AtomicBool::new(false),
            save_delay_ms: AtomicU64::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_delay(&self, delay: Duration) {
        self.save_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeakerStorePort for FlakyStore {
    async fn load(&self) -> SpeakerMap {
        self.inner.load().await
    }

    async fn save(&self, speakers: &SpeakerMap) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                self.inner.registry_file(),
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ));
        }
        self.inner.save(speakers).await
    }

    async fn store_audio(
        &self,
        name: &SpeakerName,
        sample: &AudioSample,
    ) -> Result<PathBuf, StorageError> {
        self.inner.store_audio(name, sample).await
    }

    fn locate_audio(&self, path: &Path) -> PathBuf {
        self.inner.locate_audio(path)
    }

    async fn delete_audio(&self, name: &SpeakerName) -> Result<(), StorageError> {
        self.inner.delete_audio(name).await
    }

    async fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        self.inner.remove_file(path).await
    }

    async fn sweep_audio(&self, speakers: &SpeakerMap) -> Result<usize, StorageError> {
        self.inner.sweep_audio(speakers).await
    }
}

/// 在 dir 下打开一个注册表，返回注册表和它的存储句柄
pub async fn open_registry(dir: &Path) -> (SpeakerRegistry, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::new(
        FileSpeakerStore::new(dir).await.expect("store"),
    ));
    let registry = SpeakerRegistry::open(
        store.clone(),
        Arc::new(SymphoniaAudioInspector::new()),
        RegistryConfig::default(),
    )
    .await
    .expect("registry");
    (registry, store)
}

/// 记录请求并返回固定音频的 TTS 引擎
#[derive(Default)]
pub struct StubTtsEngine {
    requests: Mutex<Vec<SynthesisRequest>>,
    unavailable: AtomicBool,
}

impl StubTtsEngine {
    pub fn unavailable() -> Self {
        let engine = Self::default();
        engine.unavailable.store(true, Ordering::SeqCst);
        engine
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TtsEnginePort for StubTtsEngine {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TtsError::NetworkError("connection refused".to_string()));
        }
        self.requests.lock().unwrap().push(request);
        Ok(SynthesisResponse {
            audio_data: wav_bytes(1),
            duration_ms: Some(1000),
            sample_rate: Some(SAMPLE_RATE),
        })
    }

    async fn health_check(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}

/// 以临时目录和给定 TTS 引擎构造 HTTP 状态
pub async fn app_state(dir: &Path, tts: Arc<StubTtsEngine>) -> (Arc<AppState>, Arc<FlakyStore>) {
    let (registry, store) = open_registry(dir).await;
    let state = AppState::new(Arc::new(registry), tts, "pt");
    (Arc::new(state), store)
}
