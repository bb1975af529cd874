//! 健康检查

use async_trait::async_trait;
use sqlx::PgPool;
use sunlease_adapter_postgres::check_connection;
use sunlease_telemetry::HealthStatus;

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> HealthStatus;
}

pub struct PostgresHealthProbe {
    pool: PgPool,
}

impl PostgresHealthProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for PostgresHealthProbe {
    async fn check(&self) -> HealthStatus {
        super::persistence::db_metrics::DbMetrics::record_pool_state(&self.pool, "primary");

        let mut status = HealthStatus::new();
        match check_connection(&self.pool).await {
            Ok(()) => status.add_check("postgres", true, None),
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                status.add_check("postgres", false, Some("unreachable".to_string()));
            }
        }
        status
    }
}
