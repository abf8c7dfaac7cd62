//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::registry::RegistryConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 注册表使用的样本限制
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            min_sample_bytes: self.storage.min_sample_bytes as usize,
            max_sample_bytes: self.storage.max_upload_size as usize,
            fallback_sample: self.storage.fallback_sample.clone(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 注册表根目录（speakers.json 与 audio/）
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// 上传文件最大大小（字节），默认 10MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// 参考音频最小大小（字节）
    #[serde(default = "default_min_sample_bytes")]
    pub min_sample_bytes: u64,

    /// 启动时替换缺失样本的备用音频，未设置则丢弃这些记录
    #[serde(default)]
    pub fallback_sample: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/speakers")
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

fn default_min_sample_bytes() -> u64 {
    1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_upload_size: default_max_upload_size(),
            min_sample_bytes: default_min_sample_bytes(),
            fallback_sample: None,
        }
    }
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,

    /// 请求和说话人都未指定语言时使用
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_language() -> String {
    "pt".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            max_retries: 0,
            default_language: default_language(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5060);
        assert_eq!(config.tts.url, "http://localhost:8000");
        assert_eq!(config.tts.default_language, "pt");
        assert_eq!(config.storage.data_dir, PathBuf::from("data/speakers"));
        assert!(config.storage.fallback_sample.is_none());
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5060");
    }

    #[test]
    fn test_registry_config_from_storage() {
        let mut config = AppConfig::default();
        config.storage.min_sample_bytes = 2048;
        config.storage.max_upload_size = 4096;
        config.storage.fallback_sample = Some(PathBuf::from("/srv/default.wav"));

        let registry = config.registry_config();
        assert_eq!(registry.min_sample_bytes, 2048);
        assert_eq!(registry.max_sample_bytes, 4096);
        assert_eq!(
            registry.fallback_sample,
            Some(PathBuf::from("/srv/default.wav"))
        );
    }
}
