//! 授权记录
//!
//! 角色默认授权 (`role_permissions`) 与用户个别授权 (`user_permissions`)
//! 在存储中都以原始字符串保存权限代码，可能包含已下线的权限；
//! 是否在目录中由解析器在叠加时判断。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sunlease_common::UserId;

use super::catalog::Permission;

/// 一条授权记录: 权限代码 + 授予/撤销
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub permission: String,
    pub granted: bool,
}

impl PermissionGrant {
    pub fn new(permission: impl Into<String>, granted: bool) -> Self {
        Self {
            permission: permission.into(),
            granted,
        }
    }

    pub fn allow(permission: impl Into<String>) -> Self {
        Self::new(permission, true)
    }

    pub fn deny(permission: impl Into<String>) -> Self {
        Self::new(permission, false)
    }
}

/// 某一时刻的用户授权快照
///
/// 角色、角色默认授权和个别授权必须来自同一时间点，
/// 数据源负责保证这一点 (例如用单条 SQL 语句读取)。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSnapshot {
    /// 用户角色 (原始值，可能为空或无法识别)
    pub role: Option<String>,
    /// 该角色的默认授权
    pub role_defaults: Vec<PermissionGrant>,
    /// 用户个别授权，按写入时间升序
    pub overrides: Vec<PermissionGrant>,
}

impl PermissionSnapshot {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Default::default()
        }
    }

    pub fn with_defaults(mut self, defaults: impl IntoIterator<Item = PermissionGrant>) -> Self {
        self.role_defaults.extend(defaults);
        self
    }

    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = PermissionGrant>) -> Self {
        self.overrides.extend(overrides);
        self
    }
}

/// 用户个别授权 (管理视图)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionOverride {
    pub user_id: UserId,
    pub permission: Permission,
    pub granted: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
}

impl UserPermissionOverride {
    pub fn new(user_id: UserId, permission: Permission, granted: bool, updated_by: UserId) -> Self {
        Self {
            user_id,
            permission,
            granted,
            updated_at: Utc::now(),
            updated_by: Some(updated_by),
        }
    }
}
