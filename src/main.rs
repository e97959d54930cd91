use std::sync::Arc;

use tokio::net::TcpListener;

use socius_server::config::{generate_config_template, Config};
use socius_server::state::AppState;
use socius_server::store::MemoryStore;
use socius_server::ws::actor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "socius_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "socius_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("Socius server v{} starting", env!("CARGO_PKG_VERSION"));

    // The store is an external collaborator behind the DocumentStore trait.
    // The bundled backend is in-process; a deployment backs the same trait
    // with a document database.
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("WebSocket transport listening on {}", addr);

    actor::serve(listener, state).await?;
    Ok(())
}
