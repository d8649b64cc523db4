//! # game-vault
//!
//! Entry point that wires the portal together according to the enabled
//! features and the layered settings from `configs`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use api_adapters::{router, AppState, PortalOptions, Ports};
use configs::{LogFormat, LogSettings, Settings, VisitorBackend};
use domains::VisitorCounterStore;
use secrecy::SecretString;
use storage_adapters::{InMemoryVisitorCounter, RemoteApi};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::info;
use tracing_subscriber::EnvFilter;

const BOARD_PRUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    let remote = Arc::new(
        RemoteApi::new(
            &settings.upstream.base_url,
            settings.upstream.service_token.clone(),
            settings.upstream.timeout(),
        )
        .context("building the remote API client")?,
    );
    info!(base_url = %settings.upstream.base_url, "remote API configured");

    let ports = Ports {
        requests: remote.clone(),
        catalog: remote.clone(),
        admin: remote.clone(),
        users: remote,
        decoder: auth_adapters::default_decoder(),
        visitors: visitor_store(&settings)?,
    };
    let options = PortalOptions {
        page_size: settings.catalog.page_size,
        search_min_chars: settings.search.min_chars,
        search_limit: settings.search.limit,
        reveal_step: settings.board.reveal_step,
        max_boards: settings.board.max_boards,
        ..PortalOptions::default()
    };
    let state = Arc::new(AppState::new(ports, options));

    let janitor = Arc::clone(&state);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(BOARD_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            janitor.boards.prune_idle();
        }
    });

    let address = settings.server.socket_addr()?;
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Server shut down");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    match log.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn visitor_store(settings: &Settings) -> Result<Arc<dyn VisitorCounterStore>> {
    match settings.visitors.backend {
        VisitorBackend::Memory => Ok(Arc::new(InMemoryVisitorCounter::new())),
        VisitorBackend::Redis => redis_store(settings.visitors.redis_url.as_ref()),
    }
}

#[cfg(feature = "redis")]
fn redis_store(url: Option<&SecretString>) -> Result<Arc<dyn VisitorCounterStore>> {
    use secrecy::ExposeSecret;

    let url = url.context("visitors.redis_url is required for the redis backend")?;
    let store = storage_adapters::RedisVisitorCounter::new(url.expose_secret())
        .context("creating the redis pool")?;
    info!("visitor counter backed by redis");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
fn redis_store(_url: Option<&SecretString>) -> Result<Arc<dyn VisitorCounterStore>> {
    anyhow::bail!("visitor backend 'redis' requires building with the `redis` feature")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
