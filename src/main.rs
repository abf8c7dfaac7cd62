//! speakerd - 声音克隆说话人注册服务
//!
//! - Domain: speaker/
//! - Application: registry, commands, queries, ports
//! - Infrastructure: http, persistence, adapters

use std::sync::Arc;

use speakerd::application::SpeakerRegistry;
use speakerd::config::{load_config, print_config, LogConfig};
use speakerd::infrastructure::adapters::{
    HttpTtsClient, HttpTtsClientConfig, SymphoniaAudioInspector,
};
use speakerd::infrastructure::http::{AppState, HttpServer, ServerConfig};
use speakerd::infrastructure::persistence::FileSpeakerStore;

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},speakerd={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("speakerd - speaker registry service");
    print_config(&config);

    // 打开说话人存储和注册表
    let store = Arc::new(FileSpeakerStore::new(&config.storage.data_dir).await?);
    let registry = Arc::new(
        SpeakerRegistry::open(
            store,
            Arc::new(SymphoniaAudioInspector::new()),
            config.registry_config(),
        )
        .await?,
    );

    // 创建 HTTP TTS 引擎
    let tts_config = HttpTtsClientConfig::new(config.tts.url.clone())
        .with_timeout(config.tts.timeout_secs)
        .with_retries(config.tts.max_retries);
    let tts_engine = Arc::new(HttpTtsClient::new(tts_config)?);

    let state = AppState::new(registry, tts_engine, config.tts.default_language.clone());
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_upload_size(config.storage.max_upload_size as usize);

    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
