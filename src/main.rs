//! Gymdesk API server.
//!
//! Wires the PostgreSQL adapters into the application handlers, exposes the
//! REST API, and runs the background expiration sweeper.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::signal;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use gymdesk::adapters::http::{api_router, AppState};
use gymdesk::adapters::postgres::{
    PostgresAccessGrantRepository, PostgresClientRepository, PostgresServiceRepository,
    PostgresSubscriptionRepository, PostgresSubscriptionStore, PostgresSubscriptionTypeRepository,
    PostgresTypeServiceRepository,
};
use gymdesk::adapters::scheduler::{ExpirationSweeper, ExpirationSweeperConfig};
use gymdesk::application::handlers::subscription::SweepExpiredHandler;
use gymdesk::config::AppConfig;
use gymdesk::ports::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.server.log_level)?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "starting gymdesk API server"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    tracing::info!("database pool created");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("migrations applied");
    }

    let state = build_state(pool);

    // Background expiration sweeper with its own shutdown channel.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_task = if config.scheduler.enabled {
        let handler = Arc::new(SweepExpiredHandler::new(
            state.subscriptions.clone(),
            state.clock.clone(),
        ));
        let sweeper = ExpirationSweeper::with_config(
            handler,
            ExpirationSweeperConfig::default()
                .with_sweep_interval(config.scheduler.sweep_interval()),
        );
        tracing::info!(
            interval_secs = config.scheduler.sweep_interval_secs,
            "expiration sweeper enabled"
        );
        Some(tokio::spawn(async move { sweeper.run(shutdown_rx).await }))
    } else {
        None
    };

    let app = build_router(state, Duration::from_secs(config.server.request_timeout_secs));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the sweeper and wait for its final pass.
    let _ = shutdown_tx.send(true);
    if let Some(task) = sweeper_task {
        let _ = task.await;
    }

    tracing::info!("shutdown complete");
    Ok(())
}

fn build_state(pool: PgPool) -> AppState {
    AppState {
        clients: Arc::new(PostgresClientRepository::new(pool.clone())),
        services: Arc::new(PostgresServiceRepository::new(pool.clone())),
        types: Arc::new(PostgresSubscriptionTypeRepository::new(pool.clone())),
        associations: Arc::new(PostgresTypeServiceRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        grants: Arc::new(PostgresAccessGrantRepository::new(pool.clone())),
        store: Arc::new(PostgresSubscriptionStore::new(pool)),
        clock: Arc::new(SystemClock),
    }
}

fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api", api_router())
        .layer(middleware)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
