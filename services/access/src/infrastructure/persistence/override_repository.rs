//! PostgreSQL 个别授权仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sunlease_adapter_postgres::map_sqlx_error;
use sunlease_common::UserId;
use sunlease_errors::AppResult;
use uuid::Uuid;

use super::db_metrics::QueryTimer;
use crate::domain::permission::{OverrideRepository, Permission, UserPermissionOverride};

pub struct PostgresOverrideRepository {
    pool: PgPool,
}

impl PostgresOverrideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OverrideRepository for PostgresOverrideRepository {
    async fn upsert(&self, record: &UserPermissionOverride) -> AppResult<()> {
        let timer = QueryTimer::new("user_permissions", "upsert");
        let result = sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission, granted, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, permission) DO UPDATE
            SET granted = EXCLUDED.granted,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(record.user_id.as_uuid())
        .bind(record.permission.as_str())
        .bind(record.granted)
        .bind(record.updated_at)
        .bind(record.updated_by.as_ref().map(|u| u.0))
        .execute(&self.pool)
        .await;
        timer.observe(&result);

        result.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete(&self, user_id: &UserId, permission: Permission) -> AppResult<bool> {
        let timer = QueryTimer::new("user_permissions", "delete");
        let result = sqlx::query("DELETE FROM user_permissions WHERE user_id = $1 AND permission = $2")
            .bind(user_id.as_uuid())
            .bind(permission.as_str())
            .execute(&self.pool)
            .await;
        timer.observe(&result);

        Ok(result.map_err(map_sqlx_error)?.rows_affected() > 0)
    }

    async fn list_by_user(&self, user_id: &UserId) -> AppResult<Vec<UserPermissionOverride>> {
        let timer = QueryTimer::new("user_permissions", "list_by_user");
        let result = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT user_id, permission, granted, updated_at, updated_by
            FROM user_permissions
            WHERE user_id = $1
            ORDER BY updated_at, permission
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await;
        timer.observe(&result);

        let rows = result.map_err(map_sqlx_error)?;
        Ok(rows.into_iter().filter_map(OverrideRow::into_override).collect())
    }
}

#[derive(sqlx::FromRow)]
struct OverrideRow {
    user_id: Uuid,
    permission: String,
    granted: bool,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl OverrideRow {
    /// 目录外的历史记录不返回给管理端
    fn into_override(self) -> Option<UserPermissionOverride> {
        let Ok(permission) = self.permission.parse::<Permission>() else {
            tracing::warn!(
                user_id = %self.user_id,
                permission = %self.permission,
                "Skipping stored override outside the catalog"
            );
            return None;
        };

        Some(UserPermissionOverride {
            user_id: UserId::from_uuid(self.user_id),
            permission,
            granted: self.granted,
            updated_at: self.updated_at,
            updated_by: self.updated_by.map(UserId::from_uuid),
        })
    }
}
