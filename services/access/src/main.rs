//! SunLease Access Service 入口

mod runtime;

use std::sync::Arc;

use secrecy::ExposeSecret;
use sunlease_access::api::http::{AppState, router};
use sunlease_access::application::PermissionResolver;
use sunlease_access::domain::permission::{OverrideRepository, PermissionSource};
use sunlease_access::infrastructure::PostgresHealthProbe;
use sunlease_access::infrastructure::persistence::{
    PostgresOverrideRepository, PostgresPermissionSource, run_migrations,
};
use sunlease_adapter_postgres::{PostgresConfig, create_pool};
use sunlease_auth_core::TokenService;
use sunlease_config::AppConfig;
use sunlease_telemetry::init_metrics;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 仅在本地开发时存在
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("SUNLEASE_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir)?;

    runtime::init_runtime(&config);

    let metrics = if config.telemetry.metrics_enabled {
        match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let pool = create_pool(
        &PostgresConfig::new(config.database.url.expose_secret())
            .with_max_connections(config.database.max_connections),
    )
    .await?;
    info!("Database pool created");

    if config.access.run_migrations {
        run_migrations(&pool).await?;
    }

    let source: Arc<dyn PermissionSource> = Arc::new(PostgresPermissionSource::new(pool.clone()));
    let overrides: Arc<dyn OverrideRepository> =
        Arc::new(PostgresOverrideRepository::new(pool.clone()));
    let resolver = PermissionResolver::new(source).with_timeout(config.access.resolve_timeout());

    let tokens = Arc::new(TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in as i64,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
    ));

    let mut state = AppState::new(
        resolver,
        overrides,
        tokens,
        Arc::new(PostgresHealthProbe::new(pool)),
    );
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Starting access service");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(runtime::shutdown_signal())
        .await?;

    info!("Access service stopped");
    Ok(())
}
