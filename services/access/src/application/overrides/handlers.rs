//! 个别授权命令处理器

use std::sync::Arc;

use sunlease_errors::AppResult;
use tracing::info;

use super::commands::*;
use crate::application::gate::AccessGate;
use crate::domain::IdentityProvider;
use crate::domain::permission::{
    OverrideRepository, Permission, PermissionSource, UserPermissionOverride,
};

/// 个别授权命令处理器
///
/// 所有写操作都要求 `permissions:manage`，先过门禁再校验参数。
pub struct OverrideCommandHandler<R>
where
    R: OverrideRepository + ?Sized,
{
    repo: Arc<R>,
}

impl<R> OverrideCommandHandler<R>
where
    R: OverrideRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 授予或撤销用户的某个权限
    pub async fn handle_set<I, S>(
        &self,
        gate: &AccessGate<I, S>,
        cmd: SetOverrideCommand,
    ) -> AppResult<UserPermissionOverride>
    where
        I: IdentityProvider,
        S: PermissionSource + ?Sized,
    {
        gate.guard(Permission::PermissionsManage, |actor| async move {
            let (user_id, permission) = cmd.validate()?;
            let record =
                UserPermissionOverride::new(user_id, permission, cmd.granted, actor.clone());

            self.repo.upsert(&record).await?;

            info!(
                user_id = %record.user_id,
                permission = %record.permission,
                granted = record.granted,
                updated_by = %actor,
                "Permission override set"
            );

            Ok(record)
        })
        .await
    }

    /// 清除用户的某个个别授权 (幂等)
    pub async fn handle_clear<I, S>(
        &self,
        gate: &AccessGate<I, S>,
        cmd: ClearOverrideCommand,
    ) -> AppResult<()>
    where
        I: IdentityProvider,
        S: PermissionSource + ?Sized,
    {
        gate.guard(Permission::PermissionsManage, |actor| async move {
            let (user_id, permission) = cmd.validate()?;
            let removed = self.repo.delete(&user_id, permission).await?;

            info!(
                user_id = %user_id,
                permission = %permission,
                removed,
                cleared_by = %actor,
                "Permission override cleared"
            );

            Ok(())
        })
        .await
    }
}
