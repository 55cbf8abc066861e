//! nms-mos - MOS protocol ingestion gateway
//!
//! Binds the MOS TCP listener (default port 10540) and the HTTP side
//! channel (health + notification stream), then runs until Ctrl+C/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nms_common::config::{load_config, TomlConfig};
use nms_common::db::init_database;
use nms_common::events::EventBus;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use nms_mos::api::{self, AppState};
use nms_mos::server::{ConnectionSettings, MosServer};
use nms_mos::store::{MemoryStore, RundownStore, SqliteStore};
use nms_mos::{ClientContext, Dispatcher};

#[derive(Parser, Debug)]
#[command(name = "nms-mos")]
#[command(about = "MOS protocol ingestion gateway for the newsroom system")]
#[command(version)]
struct Args {
    /// Configuration file (otherwise NMS_CONFIG or the platform locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MOS listener interface
    #[arg(long, env = "NMS_MOS_HOST")]
    host: Option<String>,

    /// MOS listener port
    #[arg(short, long, env = "NMS_MOS_PORT")]
    port: Option<u16>,

    /// HTTP side channel port
    #[arg(long, env = "NMS_HTTP_PORT")]
    http_port: Option<u16>,

    /// Disable the HTTP side channel
    #[arg(long)]
    no_http: bool,

    /// SQLite database file
    #[arg(short, long, env = "NMS_DATABASE")]
    database: Option<PathBuf>,

    /// Tenant id for every record written by this gateway
    #[arg(long, env = "NMS_CLIENT_ID")]
    client_id: Option<i64>,

    /// Keep rundowns in memory only (nothing persisted)
    #[arg(long)]
    memory: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "NMS_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    /// Command-line values take priority over the configuration file
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(host) = &self.host {
            config.mos.host = host.clone();
        }
        if let Some(port) = self.port {
            config.mos.port = port;
        }
        if let Some(http_port) = self.http_port {
            config.http.port = http_port;
        }
        if self.no_http {
            config.http.enabled = false;
        }
        if let Some(database) = &self.database {
            config.database_path = Some(database.clone());
        }
        if let Some(client_id) = self.client_id {
            config.client_id = client_id;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "nms_mos={0},nms_common={0},tower_http={0}",
        level
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Level from config is applied once the file is loaded
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter_layer, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| default_filter("info")));
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting nms-mos v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if !from_env {
        filter_handle
            .reload(default_filter(&config.logging.level))
            .context("Failed to apply log level")?;
    }

    let store: Arc<dyn RundownStore> = if args.memory {
        warn!("Running with in-memory store; rundowns are lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let db_path = config.database_path();
        info!("Database: {}", db_path.display());
        let pool = init_database(&db_path)
            .await
            .context("Failed to initialize database")?;
        Arc::new(SqliteStore::new(pool))
    };

    let bus = EventBus::new(config.events.capacity);
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        Arc::new(bus.clone()),
        config.mos.handler_timeout(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_task = if config.http.enabled {
        let listener = tokio::net::TcpListener::bind((config.http.host.as_str(), config.http.port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind HTTP side channel on {}:{}",
                    config.http.host, config.http.port
                )
            })?;
        let state = AppState::new(bus.clone(), config.client_id);
        Some(tokio::spawn(api::serve(
            listener,
            state,
            wait_for_shutdown(shutdown_rx.clone()),
        )))
    } else {
        info!("HTTP side channel disabled");
        None
    };

    let server = MosServer::bind(
        (config.mos.host.as_str(), config.mos.port),
        dispatcher,
        ConnectionSettings {
            ctx: ClientContext::new(config.client_id),
            max_message_bytes: config.mos.max_message_bytes,
        },
    )
    .await
    .with_context(|| {
        format!(
            "Failed to bind MOS listener on {}:{}",
            config.mos.host, config.mos.port
        )
    })?;
    info!(
        "MOS gateway ready (client_id={}, handler timeout {} ms)",
        config.client_id, config.mos.handler_timeout_ms
    );

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    server
        .run(wait_for_shutdown(shutdown_rx))
        .await
        .context("MOS server error")?;

    if let Some(task) = http_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("HTTP side channel error: {}", e),
            Err(e) => error!("HTTP side channel task failed: {}", e),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // Sender dropped also means shutdown
    let _ = rx.wait_for(|stop| *stop).await;
}

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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
