//! Support-chat client bridge
//!
//! Serves one browser tab's chat view:
//! - Login, inactivity expiry and logout
//! - Chat sessions synced with the real-time store
//! - Agent turns, feedback and the post-chat survey over webhooks
//! - Read-only history of closed sessions

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use chat_session::{ChatClient, ChatSettings, FileStorage, InitOutcome, SessionStore};
use realtime_store::{RealtimeStore, StoreBackend, StoreConfig};
use telemetry::{init_tracing_from_env, metrics};
use webhook_gateway::{AgentGateway, HttpGateway, WebhookConfig};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    webhook: WebhookConfig,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    storage: StorageConfig,

    #[serde(default)]
    chat: ChatSettings,
}

/// Where login and session keys survive restarts.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct StorageConfig {
    /// JSON file path; unset keeps everything in memory
    #[serde(default)]
    path: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook: WebhookConfig::default(),
            store: StoreConfig::default(),
            storage: StorageConfig::default(),
            chat: ChatSettings::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting support-chat v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        webhook = %config.webhook.base_url,
        store = ?config.store.backend,
        storage = config.storage.path.as_deref().unwrap_or("memory"),
        "Loaded config"
    );

    let store = realtime_store::connect(&config.store).context("Failed to create store client")?;

    let gateway: Arc<dyn AgentGateway> = Arc::new(
        HttpGateway::new(&config.webhook).context("Failed to create webhook gateway")?,
    );

    let local = match config.storage.path.as_deref() {
        Some(path) => SessionStore::new(Arc::new(
            FileStorage::open(path).context("Failed to open session storage")?,
        )),
        None => SessionStore::in_memory(),
    };

    check_health(store.as_ref(), gateway.as_ref()).await;

    let client = Arc::new(ChatClient::new(store, gateway, local, config.chat.clone()));
    match client.initialize().await {
        InitOutcome::Authenticated => info!("Restored stored login"),
        InitOutcome::Expired => info!("Stored login expired"),
        InitOutcome::Anonymous => info!("No stored login"),
    }

    let app = router(AppState::new(client.clone()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    client.dispose();

    let snapshot = metrics().snapshot();
    info!(
        sessions_started = snapshot.sessions_started,
        sessions_locked = snapshot.sessions_locked,
        turns_sent = snapshot.turns_sent,
        turn_failures = snapshot.turn_failures,
        close_failures = snapshot.close_failures,
        turn_latency_mean_ms = snapshot.turn_latency_mean_ms,
        "Final counters"
    );

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("SUPPORT_CHAT")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat overrides; nested parsing trips over underscored field names
    if let Ok(url) = std::env::var("SUPPORT_CHAT_WEBHOOK_BASE_URL") {
        config.webhook.base_url = url;
    }
    if let Ok(url) = std::env::var("SUPPORT_CHAT_STORE_URL") {
        config.store.url = url;
        config.store.backend = StoreBackend::Rest;
    }
    if let Ok(key) = std::env::var("SUPPORT_CHAT_STORE_API_KEY") {
        config.store.api_key = Some(key);
    }
    if let Ok(path) = std::env::var("SUPPORT_CHAT_STORAGE_PATH") {
        config.storage.path = Some(path);
    }

    Ok(config)
}

/// Probe both remotes once so the health endpoints start accurate.
async fn check_health(store: &dyn RealtimeStore, gateway: &dyn AgentGateway) {
    if realtime_store::health::check_connection(store).await {
        info!("Store connection: healthy");
    } else {
        error!("Store connection: unhealthy");
    }

    if webhook_gateway::health::check_connection(gateway).await {
        info!("Webhook gateway: reachable");
    } else {
        error!("Webhook gateway: unreachable");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
