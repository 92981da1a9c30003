//! # AVA Admin API Server
//!
//! Administration backend for accounts, roles and classes, secured by
//! self-issued bearer tokens.
//!
//! ## Startup
//!
//! 1. Tracing (text, or JSON lines with `LOG_FORMAT=json`)
//! 2. Configuration from the environment
//! 3. Postgres pool and embedded migrations
//! 4. Postal lookup client
//! 5. Router, served until Ctrl+C or SIGTERM
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p ava-api
//! ```

use anyhow::Context;
use ava_api::{
    app::{build_router, AppState},
    config::Config,
};
use ava_shared::{
    auth::jwt::TokenCodec,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool},
    },
    postal::ViaCepClient,
    repository::Repositories,
};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ava_api=debug,ava_shared=debug,tower_http=debug".into()),
        )
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("AVA Admin API v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(config.database.clone())
        .await
        .context("failed to connect to the database")?;

    if config.run_migrations {
        run_migrations(&pool).await.context("failed to run migrations")?;
    }

    let postal = ViaCepClient::new(&config.postal.base_url, config.postal.timeout)
        .context("failed to build postal lookup client")?;

    let state = AppState::new(
        Repositories::postgres(pool.clone()),
        Arc::new(postal),
        Arc::new(TokenCodec::new(config.jwt.secret.clone())),
        Some(pool.clone()),
    );
    let app = build_router(state, &config.api);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
