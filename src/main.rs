//! Frontend Application Monitoring Engine
//!
//! Single binary serving:
//! - SDK event ingestion with tenant gating and server-side enrichment
//! - Dashboard aggregation queries over ClickHouse
//! - Threshold alert evaluation, on demand and on a schedule

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use alerts::{AlertConfig, AlertEvaluator, AlertScheduler, LogSink, NotificationSink, WebhookSink};
use api::{router, AppState, HttpTenantDirectory};
use event_store::{StoreClient, StoreConfig};
use pipeline::{Ingestor, StaticGeoLocator};
use query_engine::{EngineConfig, QueryEngine};
use telemetry::{health, init_tracing_from_env};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Tenant directory base URL; empty or "mock" enables mock mode
    #[serde(default)]
    directory_url: String,

    /// Alert webhook URL; empty means log-only notifications
    #[serde(default)]
    alert_webhook_url: String,

    /// Scheduled alert evaluation period in seconds; 0 disables the loop
    #[serde(default = "default_alert_period_secs")]
    alert_period_secs: u64,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    query: EngineConfig,

    #[serde(default)]
    alerts: AlertConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_alert_period_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            directory_url: String::new(),
            alert_webhook_url: String::new(),
            alert_period_secs: default_alert_period_secs(),
            store: StoreConfig::default(),
            query: EngineConfig::default(),
            alerts: AlertConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!(
        "Starting Frontend Monitoring Engine v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = load_config()?;

    // Event store client
    let store = Arc::new(
        StoreClient::new(config.store.clone()).context("Failed to create event store client")?,
    );

    // Schema is ensured explicitly at startup; ingestion never creates it
    // lazily.
    if let Err(e) = event_store::health::ensure_schema(&store).await {
        error!("Failed to ensure event store schema: {}", e);
        // Continue anyway - schema might already exist
    }

    check_health(&store).await;

    // Tenant directory, shared by all three subsystems
    let directory = Arc::new(
        HttpTenantDirectory::new(&config.directory_url)
            .context("Failed to create tenant directory client")?,
    );

    // Ingestion pipeline
    let geo = Arc::new(StaticGeoLocator::default());
    let ingestor = Arc::new(Ingestor::new(directory.clone(), store.clone(), geo));

    // Query engine
    let engine = QueryEngine::new(store.clone(), config.query);

    // Alert evaluator
    let sink: Arc<dyn NotificationSink> = if config.alert_webhook_url.is_empty() {
        Arc::new(LogSink)
    } else {
        Arc::new(WebhookSink::new(&config.alert_webhook_url))
    };
    let evaluator = Arc::new(AlertEvaluator::new(
        store.clone(),
        directory.clone(),
        sink,
        config.alerts,
    ));

    // Scheduled evaluation loop
    let _scheduler_handle = if config.alert_period_secs > 0 {
        let scheduler = AlertScheduler::new(
            evaluator.clone(),
            Duration::from_secs(config.alert_period_secs),
        );
        Some(scheduler.start())
    } else {
        info!("Scheduled alert evaluation disabled");
        None
    };

    // Application state and router
    let state = AppState::new(ingestor, engine, evaluator, directory);
    let app = router(state);

    // Start HTTP server
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

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("MONITOR")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested store config from environment
    // The config crate's nested parsing doesn't work reliably with
    // underscored field names
    if let Ok(url) = std::env::var("MONITOR_STORE_URL") {
        config.store.url = url;
    }
    if let Ok(database) = std::env::var("MONITOR_STORE_DATABASE") {
        config.store.database = database;
    }
    if let Ok(username) = std::env::var("MONITOR_STORE_USERNAME") {
        config.store.username = Some(username);
    }
    if let Ok(password) = std::env::var("MONITOR_STORE_PASSWORD") {
        config.store.password = Some(password);
    }

    // Directory and webhook overrides
    if let Ok(url) = std::env::var("MONITOR_DIRECTORY_URL") {
        config.directory_url = url;
    }
    if let Ok(url) = std::env::var("MONITOR_ALERT_WEBHOOK_URL") {
        config.alert_webhook_url = url;
    }

    Ok(config)
}

/// Check component health on startup.
async fn check_health(store: &StoreClient) {
    let store_healthy = event_store::health::check_connection(store).await;
    if store_healthy {
        health().store.set_healthy();
        info!("Event store connection: healthy");
    } else {
        health().store.set_unhealthy("Connection failed");
        error!("Event store connection: unhealthy");
    }

    // The directory is checked lazily per request; assume reachable at
    // boot so readiness reflects the store alone.
    health().directory.set_healthy();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
