//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;
mod health;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use auth::{AuthAppState, MemoryUserCache, PgAuthRepository};
use feed::{FeedConfig, PgPostRepository};
use notify::{EmailConsumer, HttpMailer, InMemoryQueue, LogMailer, Mailer, QueueNotifier};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::health::HealthInfo;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "api=info,auth=info,feed=info,notify=info,platform=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_open_conns)
        .min_connections(config.db.max_idle_conns.min(config.db.max_open_conns))
        .idle_timeout(config.db.max_idle_time)
        .connect(&config.db.url)
        .await
        .context("failed to connect to the database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let auth_store = Arc::new(PgAuthRepository::new(pool.clone()));

    // Startup cleanup: expired invitations can never be redeemed
    // Errors here should not prevent server startup
    match auth_store.cleanup_expired_invitations().await {
        Ok(deleted) => {
            tracing::info!(invitations_deleted = deleted, "Invitation cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invitation cleanup failed, continuing anyway");
        }
    }

    // Notifier: in-process queue drained by the email worker
    let queue = Arc::new(InMemoryQueue::new());
    let notifier = Arc::new(QueueNotifier::new(Arc::clone(&queue)));
    let shutdown = CancellationToken::new();

    let worker = match config.mailer.clone() {
        Some(mailer_config) => {
            let mailer = HttpMailer::new(mailer_config)?;
            spawn_email_worker(Arc::clone(&queue), mailer, shutdown.clone())
        }
        None => {
            tracing::warn!("MAIL_API_URL not set, emails are logged instead of sent");
            spawn_email_worker(Arc::clone(&queue), LogMailer::new(), shutdown.clone())
        }
    };

    let cache = Arc::new(MemoryUserCache::with_enabled(config.cache_enabled));
    let sweeper = tokio::spawn({
        let cache = Arc::clone(&cache);
        let shutdown = shutdown.clone();
        let every = config.auth.user_cache_ttl;
        async move { cache.run_sweeper(every, shutdown).await }
    });

    let auth_state = AuthAppState::new(
        auth_store,
        cache,
        notifier,
        config.rate_limit.build(),
        config.auth.clone(),
    );

    let app = routes::app(
        auth_state,
        Arc::new(PgPostRepository::new(pool.clone())),
        FeedConfig::default(),
        HealthInfo {
            environment: config.env.clone(),
        },
    );
    let app = routes::with_layers(app, &config.frontend_origins);

    // Start server
    tracing::info!(addr = %config.addr, env = %config.env, "Listening");

    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    // Requests are drained; stop the worker and close the pool
    shutdown.cancel();
    queue.close();
    if let Err(e) = worker.await {
        tracing::warn!(error = %e, "email worker ended abnormally");
    }
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "user cache sweeper ended abnormally");
    }
    pool.close().await;

    tracing::info!("Server stopped");
    Ok(())
}

fn spawn_email_worker<M>(
    queue: Arc<InMemoryQueue>,
    mailer: M,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    M: Mailer + Send + Sync + 'static,
{
    let consumer = EmailConsumer::new(queue, Arc::new(mailer));
    tokio::spawn(async move { consumer.run(shutdown).await })
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
        _ = shutdown.cancelled() => {}
    }
}
