//! Binary entrypoint for the chatgraph HTTP server.
//!
//! Configuration comes from the environment; see [`ServerConfig`]. The log
//! filter is read from `RUST_LOG` (default: `info`).

use chatgraph_server::config::ServerConfig;
use chatgraph_server::router::build_router;
use chatgraph_server::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let state = AppState::new(&config.db_path)?;
    let app = build_router(state);

    let addr = config.addr();
    tracing::info!("chatgraph server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
