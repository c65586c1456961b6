use axum::{Router, routing::get};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use switchboard_server::{
    RelayConfig, RelayState, SignalingRouter, SignalingService, ws_handler,
};

/// Call-signaling relay: pairs peers up over rooms or direct dialing and
/// shuttles their session descriptions and candidates. Media never touches
/// this process.
#[derive(Parser)]
#[command(name = "switchboard-relay")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Seconds a call may ring before it fails with no-answer.
    #[arg(long, default_value_t = 45)]
    ring_timeout: u64,

    /// Milliseconds between ring-deadline sweeps.
    #[arg(long, default_value_t = 1000)]
    sweep_interval: u64,

    /// Per-direction cap on candidates buffered while a call rings.
    #[arg(long, default_value_t = 50)]
    candidate_cap: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = RelayConfig {
        ring_timeout: Duration::from_secs(args.ring_timeout),
        sweep_interval: Duration::from_millis(args.sweep_interval),
        candidate_cap: args.candidate_cap,
    };

    let service = SignalingService::new();
    let router = SignalingRouter::new(Arc::new(service.clone()), config.clone());
    router.spawn_supervisor(&config);

    // Browser clients connect from another origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(RelayState { service, router });

    info!("Signaling relay listening on http://{}", args.bind);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
