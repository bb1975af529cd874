//! 访问门禁
//!
//! 每个请求构造一个 `AccessGate`，组合当前身份与权限解析器。
//! 敏感操作通过 `require` / `guard` 先完成检查再执行，拒绝时操作本身不会被调用。

use std::future::Future;

use sunlease_common::UserId;
use sunlease_errors::AppResult;
use tracing::{debug, warn};

use super::resolver::PermissionResolver;
use crate::domain::IdentityProvider;
use crate::domain::permission::{EffectivePermissions, Permission, PermissionSource};
use crate::error::AccessError;

pub struct AccessGate<I, S>
where
    I: IdentityProvider,
    S: PermissionSource + ?Sized,
{
    identity: I,
    resolver: PermissionResolver<S>,
}

impl<I, S> AccessGate<I, S>
where
    I: IdentityProvider,
    S: PermissionSource + ?Sized,
{
    pub fn new(identity: I, resolver: PermissionResolver<S>) -> Self {
        Self { identity, resolver }
    }

    /// 当前已认证用户；身份提供方出错时视为未登录
    pub async fn current_user(&self) -> Option<UserId> {
        match self.identity.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Identity provider failed, treating request as anonymous");
                None
            }
        }
    }

    pub async fn effective_permissions(&self) -> EffectivePermissions {
        let user = self.current_user().await;
        self.resolver.resolve_effective_permissions(user.as_ref()).await
    }

    pub async fn check(&self, permission: Permission) -> bool {
        let user = self.current_user().await;
        self.resolver.has(user.as_ref(), permission).await
    }

    /// 要求当前用户拥有指定权限，返回执行操作的用户
    ///
    /// 未登录、缺少权限、数据源故障返回同一个 `Forbidden("Not authorized")`，
    /// 具体原因只写入日志。
    pub async fn require(&self, permission: Permission) -> AppResult<UserId> {
        let Some(user) = self.current_user().await else {
            debug!(permission = %permission, "Denied: no authenticated user");
            return Err(AccessError::NotAuthorized.into());
        };

        if self.resolver.has(Some(&user), permission).await {
            Ok(user)
        } else {
            debug!(user_id = %user, permission = %permission, "Denied: permission not granted");
            Err(AccessError::NotAuthorized.into())
        }
    }

    /// 只要求已登录，不检查具体权限；拒绝时与 `require` 相同
    pub async fn require_authenticated(&self) -> AppResult<UserId> {
        match self.current_user().await {
            Some(user) => Ok(user),
            None => {
                debug!("Denied: no authenticated user");
                Err(AccessError::NotAuthorized.into())
            }
        }
    }

    /// 检查通过后执行操作
    ///
    /// `operation` 仅在授权成功后被调用，拒绝时连 future 都不会创建。
    pub async fn guard<T, F, Fut>(&self, permission: Permission, operation: F) -> AppResult<T>
    where
        F: FnOnce(UserId) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let actor = self.require(permission).await?;
        operation(actor).await
    }
}
