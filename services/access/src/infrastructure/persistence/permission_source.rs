//! PostgreSQL 权限数据源
//!
//! 用单条语句读取角色、角色默认授权和个别授权，三者来自同一快照。

use async_trait::async_trait;
use sqlx::PgPool;
use sunlease_adapter_postgres::map_sqlx_error;
use sunlease_common::UserId;
use sunlease_errors::AppResult;

use super::db_metrics::QueryTimer;
use crate::domain::permission::{PermissionGrant, PermissionSnapshot, PermissionSource};

const SNAPSHOT_SQL: &str = r#"
    SELECT 'profile' AS source, p.role AS role,
           NULL::TEXT AS permission, NULL::BOOLEAN AS granted,
           NULL::TIMESTAMPTZ AS updated_at, 0 AS ord
    FROM profiles p
    WHERE p.id = $1
    UNION ALL
    SELECT 'role_default', NULL, rp.permission, rp.granted, NULL, 1
    FROM profiles p
    INNER JOIN role_permissions rp ON rp.role = p.role
    WHERE p.id = $1
    UNION ALL
    SELECT 'override', NULL, up.permission, up.granted, up.updated_at, 2
    FROM user_permissions up
    WHERE up.user_id = $1
    ORDER BY ord, updated_at, permission
"#;

pub struct PostgresPermissionSource {
    pool: PgPool,
}

impl PostgresPermissionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionSource for PostgresPermissionSource {
    async fn load_snapshot(&self, user_id: &UserId) -> AppResult<Option<PermissionSnapshot>> {
        let timer = QueryTimer::new("user_permissions", "load_snapshot");
        let result = sqlx::query_as::<_, SnapshotRow>(SNAPSHOT_SQL)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await;
        timer.observe(&result);

        Ok(snapshot_from_rows(result.map_err(map_sqlx_error)?))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    source: String,
    role: Option<String>,
    permission: Option<String>,
    granted: Option<bool>,
}

/// 没有 profile 行表示用户不存在
fn snapshot_from_rows(rows: Vec<SnapshotRow>) -> Option<PermissionSnapshot> {
    let mut found = false;
    let mut snapshot = PermissionSnapshot::default();

    for row in rows {
        match row.source.as_str() {
            "profile" => {
                found = true;
                snapshot.role = row.role.filter(|r| !r.is_empty());
            }
            "role_default" | "override" => {
                let (Some(permission), Some(granted)) = (row.permission, row.granted) else {
                    continue;
                };
                let grant = PermissionGrant::new(permission, granted);
                if row.source == "override" {
                    snapshot.overrides.push(grant);
                } else {
                    snapshot.role_defaults.push(grant);
                }
            }
            _ => {}
        }
    }

    found.then_some(snapshot)
}
