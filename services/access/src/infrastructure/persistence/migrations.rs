//! 权限表结构迁移

use sqlx::PgPool;
use sunlease_adapter_postgres::{Migration, Migrator};
use sunlease_errors::AppResult;

const MIGRATION_TABLE: &str = "_access_migrations";

pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "permission_schema",
            include_str!("../../../migrations/0001_permission_schema.sql"),
        ),
        Migration::new(
            2,
            "seed_role_defaults",
            include_str!("../../../migrations/0002_seed_role_defaults.sql"),
        ),
    ]
}

/// 执行所有待处理的迁移
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    Migrator::new(pool.clone())
        .with_table(MIGRATION_TABLE)
        .run(&migrations())
        .await?;
    Ok(())
}
