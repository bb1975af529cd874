//! 权限数据源与个别授权仓储接口

use async_trait::async_trait;
use sunlease_common::UserId;
use sunlease_errors::AppResult;

use super::catalog::Permission;
use super::grant::{PermissionSnapshot, UserPermissionOverride};

/// 权限数据源
///
/// 解析器每次决策都会调用一次，实现不得缓存结果。
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// 读取用户的角色、角色默认授权和个别授权
    ///
    /// 用户不存在时返回 `Ok(None)`。
    async fn load_snapshot(&self, user_id: &UserId) -> AppResult<Option<PermissionSnapshot>>;
}

/// 个别授权仓储接口
#[async_trait]
pub trait OverrideRepository: Send + Sync {
    /// 新增或更新一条个别授权
    async fn upsert(&self, record: &UserPermissionOverride) -> AppResult<()>;

    /// 删除一条个别授权，返回是否确实删除了记录
    async fn delete(&self, user_id: &UserId, permission: Permission) -> AppResult<bool>;

    /// 列出用户的所有个别授权
    async fn list_by_user(&self, user_id: &UserId) -> AppResult<Vec<UserPermissionOverride>>;
}
