// Framework bootstrap for the race server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{create_race_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RaceRegistry, RaceSettings};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    serve(listener, build_state()).await
}

/// Serves the race routes over an already-built state, so callers can share the registry.
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> Result<()> {
    let address = listener.local_addr()?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/races", post(create_race_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    // Owns the set of running race tasks.
    let race_registry = Arc::new(RaceRegistry::new(RaceSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        frame_broadcast_capacity: config::FRAME_BROADCAST_CAPACITY,
        tick_interval: config::TICK_INTERVAL,
        finished_linger: config::FINISHED_RACE_LINGER,
    }));

    let seed_override = config::race_seed();
    if let Some(seed) = seed_override {
        tracing::info!(seed, "using fixed race seed");
    }

    Arc::new(AppState {
        race_registry,
        seed_override,
    })
}
