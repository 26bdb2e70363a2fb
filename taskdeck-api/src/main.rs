//! # Taskdeck API Server
//!
//! Serves the task and folder API over HTTP.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` honoured)
//! 2. Connect the database pool and apply migrations
//! 3. Start the notification dispatcher
//! 4. Serve until ctrl-c, then drain notifications and close the pool
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskdeck-api
//! ```

use std::sync::Arc;

use taskdeck_api::{
    app::{build_router, notification_transport, AppState},
    config::Config,
};
use taskdeck_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    notify::{dispatcher::spawn_dispatcher, QueuedNotifier},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Taskdeck API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig::with_url(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await?;

    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    let (notifier, rx) = QueuedNotifier::new(config.notify.queue_capacity);
    let transport = notification_transport(&config.notify)?;
    tracing::info!(transport = transport.name(), "Notification transport ready");

    let shutdown = CancellationToken::new();
    let dispatcher = spawn_dispatcher(rx, transport, shutdown.clone());

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config, Arc::new(notifier));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, draining notifications");
    shutdown.cancel();
    if let Err(e) = dispatcher.await {
        tracing::warn!(error = %e, "Notification dispatcher ended abnormally");
    }

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Console output by default; `LOG_FORMAT=json` for JSON lines
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskdeck_api=debug,taskdeck_shared=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
