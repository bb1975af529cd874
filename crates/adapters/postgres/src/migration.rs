//! PostgreSQL 迁移
//!
//! 所有待执行的迁移在同一个事务内按版本号顺序执行，事务开始时获取
//! advisory lock，多个实例同时启动时只有一个会真正执行。
//! 已执行迁移的脚本被修改 (校验和不一致) 时整体失败，不做任何变更。

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use sqlx::PgPool;
use sunlease_errors::{AppError, AppResult};
use tracing::{debug, info};

use crate::error::map_sqlx_error;

/// 一个迁移脚本
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    /// 可包含多条语句
    pub sql: &'static str,
    checksum: String,
}

impl Migration {
    pub fn new(version: i64, name: &'static str, sql: &'static str) -> Self {
        Self {
            version,
            name,
            sql,
            checksum: hex::encode(Sha256::digest(sql.as_bytes())),
        }
    }

    /// SHA-256 十六进制
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

/// 迁移执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// 本次执行的版本
    pub applied: Vec<i64>,
    /// 之前已执行过的数量
    pub already_applied: usize,
}

pub struct Migrator {
    pool: PgPool,
    table: String,
}

impl Migrator {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: "_migrations".to_string(),
        }
    }

    /// 记录表名，只允许字母、数字和下划线
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub async fn run(&self, migrations: &[Migration]) -> AppResult<MigrationReport> {
        validate_table_name(&self.table)?;
        let pending = ordered(migrations)?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&self.table)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                version BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                checksum CHAR(64) NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            self.table
        ))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let recorded: HashMap<i64, String> = sqlx::query_as::<_, (i64, String)>(&format!(
            "SELECT version, checksum FROM {}",
            self.table
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .into_iter()
        .collect();

        let mut report = MigrationReport::default();

        for migration in pending {
            if let Some(checksum) = recorded.get(&migration.version) {
                if checksum.trim() != migration.checksum() {
                    return Err(AppError::conflict(format!(
                        "Migration {} ({}) was modified after being applied",
                        migration.version, migration.name
                    )));
                }
                report.already_applied += 1;
                continue;
            }

            debug!(version = migration.version, name = migration.name, "Applying migration");

            sqlx::raw_sql(migration.sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::database(format!(
                        "Migration {} ({}) failed: {}",
                        migration.version, migration.name, e
                    ))
                })?;

            sqlx::query(&format!(
                "INSERT INTO {} (version, name, checksum) VALUES ($1, $2, $3)",
                self.table
            ))
            .bind(migration.version)
            .bind(migration.name)
            .bind(migration.checksum())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            report.applied.push(migration.version);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        info!(
            table = %self.table,
            applied = report.applied.len(),
            already_applied = report.already_applied,
            "Migrations complete"
        );

        Ok(report)
    }
}

fn validate_table_name(table: &str) -> AppResult<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid migration table name: {table}")))
    }
}

/// 按版本排序，版本号重复视为错误
fn ordered(migrations: &[Migration]) -> AppResult<Vec<&Migration>> {
    let mut sorted: Vec<&Migration> = migrations.iter().collect();
    sorted.sort_by_key(|m| m.version);

    if let Some(pair) = sorted.windows(2).find(|w| w[0].version == w[1].version) {
        return Err(AppError::validation(format!(
            "Duplicate migration version {}: {} and {}",
            pair[0].version, pair[0].name, pair[1].name
        )));
    }

    Ok(sorted)
}
