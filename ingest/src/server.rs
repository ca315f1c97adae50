use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::adapters::AdapterRegistry;
use crate::config::Config;
use crate::router::router;

/// Run the ingest service until `shutdown` resolves. Migrations run at
/// startup so a fresh database is usable without a separate step.
pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let pool = common_database::get_pool(&config.database_url, config.max_pg_connections)
        .await
        .expect("failed to create database pool");

    warehouse_core::MIGRATOR
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let registry = Arc::new(AdapterRegistry::with_builtins());
    tracing::info!(sources = ?registry.sources(), "adapters registered");

    let app = router(registry, pool, config.export_prometheus);

    tracing::info!("listening on {:?}", listener.local_addr().ok());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("failed to start serving");
}
