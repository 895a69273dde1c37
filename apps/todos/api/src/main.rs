//! Todos API: REST and GraphQL on the HTTP listener, gRPC on its own port,
//! all sharing one PostgreSQL-backed repository.

mod config;
mod server;
mod shutdown;

use config::Config;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::connect_with_retry;
use domain_todos::{PgTodoRepository, SharedRepository};
use eyre::WrapErr;
use shutdown::ShutdownCoordinator;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        environment = ?config.environment,
        http = %config.http.address(),
        grpc = %config.grpc.address(),
        "starting todos-api"
    );

    let db = connect_with_retry(config.database.clone(), None)
        .await
        .wrap_err("failed to connect to PostgreSQL")?;
    let repository: SharedRepository = Arc::new(PgTodoRepository::new(db.clone()));

    let coordinator = ShutdownCoordinator::new();

    let http = tokio::spawn(server::serve_http(
        config.http.clone(),
        server::http_app(
            SharedRepository::clone(&repository),
            db.clone(),
            config.cors_origins.clone(),
        ),
        coordinator.signalled(),
    ));
    let grpc = tokio::spawn(server::serve_grpc(
        config.grpc.clone(),
        repository,
        coordinator.signalled(),
    ));

    let signals = coordinator.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let budget = config.shutdown_timeout;
    let mut started = coordinator.subscribe();
    tokio::spawn(async move {
        let _ = started.recv().await;
        tokio::time::sleep(budget).await;
        error!(?budget, "graceful shutdown exceeded its budget, exiting");
        std::process::exit(1);
    });

    let (http, grpc) = tokio::join!(
        supervise("HTTP", http, &coordinator),
        supervise("gRPC", grpc, &coordinator),
    );

    if let Err(e) = db.close().await {
        error!(error = %e, "failed to close database pool");
    }
    info!("shutdown complete");

    http.and(grpc)
}

/// Awaits one listener; whatever ends it also stops the other.
async fn supervise(
    name: &'static str,
    handle: JoinHandle<eyre::Result<()>>,
    coordinator: &ShutdownCoordinator,
) -> eyre::Result<()> {
    let result = handle
        .await
        .wrap_err_with(|| format!("{name} listener task panicked"))
        .and_then(|r| r);

    match &result {
        Ok(()) => info!(listener = name, "listener stopped"),
        Err(e) => error!(listener = name, error = ?e, "listener failed"),
    }
    coordinator.shutdown();

    result
}
