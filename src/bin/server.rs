//! Hospital records server: reads env config, connects (with retries), bootstraps the schema and
//! serves the API until Ctrl-C.

use hospital_records::{app, ensure_schema, load_from_env, AppState};
use std::path::Path;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hospital_records=info,tower_http=info")),
        )
        .init();

    ensure_sqlite_dir(&config.database_url).await?;
    let state = AppState::from_config(&config)?;
    state.gateway.connect().await?;
    if config.bootstrap_schema {
        ensure_schema(&state.gateway).await?;
    }

    let router = app(state.clone(), &config);
    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        procedures = config.use_procedures,
        "hospital records listening"
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.gateway.close().await;
    Ok(())
}

/// `mode=rwc` creates the SQLite file but not its directory.
async fn ensure_sqlite_dir(url: &str) -> std::io::Result<()> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = Path::new(rest.split('?').next().unwrap_or_default());
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir).await,
        _ => Ok(()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
