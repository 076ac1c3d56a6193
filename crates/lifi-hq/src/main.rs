//! LiFi HQ - bridge server for the mesh headquarters device
//!
//! This binary runs the HQ bridge with:
//! - Serial link to the HQ LiFi device (explicit port or discovery)
//! - Node and message store (SQLite file or in-memory)
//! - WebSocket feed of link events and REST API for operators

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lifi_hq::{server, AppState};
use lifi_link::{LinkConfig, LinkError};
use lifi_state::{MemoryStore, MeshStore, SqliteStore};

#[derive(Parser)]
#[command(name = "lifi-hq")]
#[command(about = "HQ bridge between the LiFi mesh device and operator clients")]
#[command(version)]
struct Args {
    /// Serial port of the HQ device (discovered when omitted)
    #[arg(long, short)]
    port: Option<String>,

    /// Connect to the device on startup
    #[arg(long)]
    auto_connect: bool,

    /// SQLite database path or `sqlite:` URL (in-memory store when omitted)
    #[arg(long)]
    db: Option<String>,

    /// HTTP server port (0 = auto-assign)
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("Starting LiFi HQ v{}", env!("CARGO_PKG_VERSION"));

    // Initialize state store
    let store: Arc<dyn MeshStore> = match &args.db {
        Some(path) => {
            let store = if path.starts_with("sqlite:") {
                SqliteStore::new(path).await?
            } else {
                SqliteStore::open(path).await?
            };
            info!("Database initialized: {}", path);
            Arc::new(store)
        }
        None => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let mut builder = LinkConfig::builder();
    if let Some(port) = &args.port {
        builder = builder.port(port.as_str());
    }
    let config = builder.build();
    config.validate()?;
    let state = Arc::new(AppState::new(store, config));

    if args.auto_connect {
        auto_connect(&state).await;
    }

    // Start HTTP server - bind to requested port (0 = auto-assign)
    let http_bind_addr = format!("0.0.0.0:{}", args.http_port);
    let listener = tokio::net::TcpListener::bind(&http_bind_addr).await?;
    let actual_http_port = listener.local_addr()?.port();

    info!("═══════════════════════════════════════════════════════════");
    info!("  HQ server listening on http://127.0.0.1:{}", actual_http_port);
    info!("  WebSocket endpoint: ws://127.0.0.1:{}/ws", actual_http_port);
    info!("  REST API: http://127.0.0.1:{}/api/", actual_http_port);
    info!("═══════════════════════════════════════════════════════════");

    let app = server::create_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    state.link.lock().await.disconnect().await;

    Ok(())
}

/// Try the device once at startup; the server runs either way
async fn auto_connect(state: &AppState) {
    let mut link = state.link.lock().await;
    match link.connect(None).await {
        Ok(()) => info!(port = ?link.port(), "Connected to HQ device"),
        Err(LinkError::NoDeviceFound { available }) => {
            warn!("No LiFi device found, waiting for a connect command");
            for port in available {
                info!("  available port: {}", port);
            }
        }
        Err(e) => error!(error = %e, code = e.error_code(), "Failed to connect to HQ device"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
