//! 个别授权查询处理器

use std::sync::Arc;

use sunlease_errors::AppResult;

use super::commands::parse_user_id;
use super::queries::*;
use crate::application::gate::AccessGate;
use crate::domain::IdentityProvider;
use crate::domain::permission::{
    OverrideRepository, Permission, PermissionSource, UserPermissionOverride,
};

/// 个别授权查询处理器
pub struct OverrideQueryHandler<R>
where
    R: OverrideRepository + ?Sized,
{
    repo: Arc<R>,
}

impl<R> OverrideQueryHandler<R>
where
    R: OverrideRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 列出用户的个别授权，要求 `permissions:view`
    pub async fn handle_list<I, S>(
        &self,
        gate: &AccessGate<I, S>,
        query: ListOverridesQuery,
    ) -> AppResult<Vec<UserPermissionOverride>>
    where
        I: IdentityProvider,
        S: PermissionSource + ?Sized,
    {
        gate.guard(Permission::PermissionsView, |_actor| async move {
            let user_id = parse_user_id(&query.user_id)?;
            self.repo.list_by_user(&user_id).await
        })
        .await
    }
}
