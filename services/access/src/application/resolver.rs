//! 权限解析服务
//!
//! 计算用户的有效权限集合并回答单个权限查询。
//!
//! 失败即拒绝: 未登录、用户或角色不存在、角色无法识别、数据源报错或超时，
//! 结果都是空集合。这里不向调用方返回任何错误，调用方无需也不能自行兜底。

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use sunlease_common::UserId;
use sunlease_errors::AppError;
use tracing::{debug, error, warn};

use crate::domain::permission::{
    EffectivePermissions, Permission, PermissionSnapshot, PermissionSource, Role,
};

/// 单次解析的结果分类 (仅用于日志和指标)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionOutcome {
    Resolved,
    Unauthenticated,
    NoRole,
    ProviderError,
    Timeout,
}

impl ResolutionOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Unauthenticated => "unauthenticated",
            Self::NoRole => "no_role",
            Self::ProviderError => "provider_error",
            Self::Timeout => "timeout",
        }
    }
}

enum LoadFailure {
    Provider(AppError),
    Timeout(Duration),
}

/// 权限解析器
///
/// 无内部可变状态，可以在并发请求间共享 (克隆只复制 `Arc`)。
pub struct PermissionResolver<S>
where
    S: PermissionSource + ?Sized,
{
    source: Arc<S>,
    timeout: Option<Duration>,
}

impl<S> Clone for PermissionResolver<S>
where
    S: PermissionSource + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            timeout: self.timeout,
        }
    }
}

impl<S> PermissionResolver<S>
where
    S: PermissionSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            timeout: None,
        }
    }

    /// 设置数据源读取超时，超时按拒绝处理
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 计算用户的有效权限集合
    ///
    /// `user_id` 为 `None` 表示当前请求没有已认证身份。
    pub async fn resolve_effective_permissions(
        &self,
        user_id: Option<&UserId>,
    ) -> EffectivePermissions {
        let start = Instant::now();

        let (outcome, permissions) = match user_id {
            Some(user_id) => self.resolve_for(user_id).await,
            None => (ResolutionOutcome::Unauthenticated, EffectivePermissions::empty()),
        };

        counter!("permission_resolutions_total", "outcome" => outcome.as_str()).increment(1);
        histogram!("permission_resolution_duration_ms").record(start.elapsed().as_millis() as f64);

        permissions
    }

    /// 判断用户是否拥有某个权限 (权限代码形式)
    ///
    /// 目录外的代码直接返回 `false`，不访问数据源。
    pub async fn has_permission(&self, user_id: Option<&UserId>, permission: &str) -> bool {
        match permission.parse::<Permission>() {
            Ok(permission) => self.has(user_id, permission).await,
            Err(_) => {
                warn!(permission, "Permission check with code outside the catalog");
                counter!("permission_checks_unknown_total").increment(1);
                false
            }
        }
    }

    /// 判断用户是否拥有某个权限
    pub async fn has(&self, user_id: Option<&UserId>, permission: Permission) -> bool {
        let allowed = self
            .resolve_effective_permissions(user_id)
            .await
            .contains(permission);

        counter!(
            "permission_checks_total",
            "permission" => permission.as_str(),
            "allowed" => if allowed { "true" } else { "false" }
        )
        .increment(1);

        allowed
    }

    async fn resolve_for(&self, user_id: &UserId) -> (ResolutionOutcome, EffectivePermissions) {
        let snapshot = match self.load(user_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(user_id = %user_id, "No profile found for user");
                return (ResolutionOutcome::NoRole, EffectivePermissions::empty());
            }
            Err(LoadFailure::Provider(e)) => {
                error!(user_id = %user_id, error = %e, "Permission source failed, denying");
                return (ResolutionOutcome::ProviderError, EffectivePermissions::empty());
            }
            Err(LoadFailure::Timeout(after)) => {
                error!(
                    user_id = %user_id,
                    timeout_ms = after.as_millis() as u64,
                    "Permission source timed out, denying"
                );
                return (ResolutionOutcome::Timeout, EffectivePermissions::empty());
            }
        };

        let Some(role) = snapshot.role.as_deref() else {
            debug!(user_id = %user_id, "User has no role");
            return (ResolutionOutcome::NoRole, EffectivePermissions::empty());
        };

        if role.parse::<Role>().is_err() {
            warn!(user_id = %user_id, role, "User has an unrecognised role");
            return (ResolutionOutcome::NoRole, EffectivePermissions::empty());
        }

        let permissions =
            EffectivePermissions::overlay(&snapshot.role_defaults, &snapshot.overrides);

        debug!(
            user_id = %user_id,
            role,
            granted = permissions.len(),
            overrides = snapshot.overrides.len(),
            "Effective permissions resolved"
        );

        (ResolutionOutcome::Resolved, permissions)
    }

    async fn load(&self, user_id: &UserId) -> Result<Option<PermissionSnapshot>, LoadFailure> {
        let load = self.source.load_snapshot(user_id);

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, load)
                .await
                .map_err(|_| LoadFailure::Timeout(timeout))?
                .map_err(LoadFailure::Provider),
            None => load.await.map_err(LoadFailure::Provider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use sunlease_errors::AppResult;

    use crate::domain::permission::PermissionGrant;

    // --- Mocks ---

    #[derive(Default)]
    struct MockPermissionSource {
        snapshots: HashMap<UserId, PermissionSnapshot>,
        fail: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MockPermissionSource {
        fn with_user(mut self, user_id: &UserId, snapshot: PermissionSnapshot) -> Self {
            self.snapshots.insert(user_id.clone(), snapshot);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PermissionSource for MockPermissionSource {
        async fn load_snapshot(&self, user_id: &UserId) -> AppResult<Option<PermissionSnapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(AppError::database("connection reset by peer"));
            }
            Ok(self.snapshots.get(user_id).cloned())
        }
    }

    fn seller_snapshot() -> PermissionSnapshot {
        PermissionSnapshot::new("seller").with_defaults([
            PermissionGrant::allow("sellers:view"),
            PermissionGrant::allow("simulations:view"),
        ])
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_unauthenticated_is_empty_without_lookup() {
        let source = Arc::new(MockPermissionSource::default());
        let resolver = PermissionResolver::new(source.clone());

        assert!(resolver.resolve_effective_permissions(None).await.is_empty());
        assert!(!resolver.has(None, Permission::CustomersView).await);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_role_defaults() {
        let user = UserId::new();
        let source = Arc::new(MockPermissionSource::default().with_user(&user, seller_snapshot()));
        let resolver = PermissionResolver::new(source);

        let effective = resolver.resolve_effective_permissions(Some(&user)).await;
        assert_eq!(
            effective.to_sorted_vec(),
            vec![Permission::SellersView, Permission::SimulationsView]
        );
    }

    #[tokio::test]
    async fn test_overrides_applied_over_defaults() {
        let user = UserId::new();
        let snapshot = seller_snapshot().with_overrides([
            PermissionGrant::deny("simulations:view"),
            PermissionGrant::allow("orders:view"),
        ]);
        let source = Arc::new(MockPermissionSource::default().with_user(&user, snapshot));
        let resolver = PermissionResolver::new(source);

        assert_eq!(
            resolver
                .resolve_effective_permissions(Some(&user))
                .await
                .to_sorted_vec(),
            vec![Permission::SellersView, Permission::OrdersView]
        );
    }

    #[tokio::test]
    async fn test_unknown_user_is_empty() {
        let resolver = PermissionResolver::new(Arc::new(MockPermissionSource::default()));
        let effective = resolver.resolve_effective_permissions(Some(&UserId::new())).await;
        assert!(effective.is_empty());
    }

    #[tokio::test]
    async fn test_missing_role_is_empty() {
        let user = UserId::new();
        let snapshot = PermissionSnapshot {
            role: None,
            role_defaults: vec![],
            overrides: vec![PermissionGrant::allow("customers:view")],
        };
        let source = Arc::new(MockPermissionSource::default().with_user(&user, snapshot));
        let resolver = PermissionResolver::new(source);

        assert!(resolver.resolve_effective_permissions(Some(&user)).await.is_empty());
    }

    #[tokio::test]
    async fn test_unrecognised_role_is_empty() {
        let user = UserId::new();
        let snapshot = PermissionSnapshot::new("superuser")
            .with_defaults([PermissionGrant::allow("customers:view")]);
        let source = Arc::new(MockPermissionSource::default().with_user(&user, snapshot));
        let resolver = PermissionResolver::new(source);

        assert!(resolver.resolve_effective_permissions(Some(&user)).await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_is_empty() {
        let user = UserId::new();
        let source = MockPermissionSource {
            fail: true,
            ..Default::default()
        }
        .with_user(&user, seller_snapshot());
        let resolver = PermissionResolver::new(Arc::new(source));

        assert!(resolver.resolve_effective_permissions(Some(&user)).await.is_empty());
        assert!(!resolver.has_permission(Some(&user), "sellers:view").await);
    }

    #[tokio::test]
    async fn test_timeout_is_empty() {
        let user = UserId::new();
        let source = MockPermissionSource {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        }
        .with_user(&user, seller_snapshot());
        let resolver =
            PermissionResolver::new(Arc::new(source)).with_timeout(Duration::from_millis(10));

        assert!(resolver.resolve_effective_permissions(Some(&user)).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_code_skips_lookup() {
        let user = UserId::new();
        let source = Arc::new(MockPermissionSource::default().with_user(&user, seller_snapshot()));
        let resolver = PermissionResolver::new(source.clone());

        assert!(!resolver.has_permission(Some(&user), "sellers:approve").await);
        assert!(!resolver.has_permission(Some(&user), "").await);
        assert_eq!(source.calls(), 0);

        assert!(resolver.has_permission(Some(&user), "sellers:view").await);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_each_call_reads_fresh_snapshot() {
        let user = UserId::new();
        let source = Arc::new(MockPermissionSource::default().with_user(&user, seller_snapshot()));
        let resolver = PermissionResolver::new(source.clone());

        resolver.has(Some(&user), Permission::SellersView).await;
        resolver.has(Some(&user), Permission::SimulationsView).await;
        resolver.resolve_effective_permissions(Some(&user)).await;

        assert_eq!(source.calls(), 3);
    }
}
