//! 权限目录
//!
//! 系统内所有权限标识的唯一来源。目录在编译期确定，只能随新版本发布变化；
//! 不在目录内的标识 (拼写错误、已下线的权限) 永远不会被解析为已授权。
//!
//! 权限代码格式为 `resource:action`，例如 `customers:view`。

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::AccessError;

/// 权限
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Permission {
    #[strum(serialize = "customers:view")]
    CustomersView,
    #[strum(serialize = "customers:create")]
    CustomersCreate,
    #[strum(serialize = "customers:edit")]
    CustomersEdit,
    #[strum(serialize = "customers:delete")]
    CustomersDelete,

    #[strum(serialize = "partners:view")]
    PartnersView,
    #[strum(serialize = "partners:create")]
    PartnersCreate,
    #[strum(serialize = "partners:edit")]
    PartnersEdit,
    #[strum(serialize = "partners:delete")]
    PartnersDelete,

    #[strum(serialize = "sellers:view")]
    SellersView,
    #[strum(serialize = "sellers:create")]
    SellersCreate,
    #[strum(serialize = "sellers:edit")]
    SellersEdit,
    #[strum(serialize = "sellers:delete")]
    SellersDelete,

    #[strum(serialize = "equipment:view")]
    EquipmentView,
    #[strum(serialize = "equipment:create")]
    EquipmentCreate,
    #[strum(serialize = "equipment:edit")]
    EquipmentEdit,
    #[strum(serialize = "equipment:delete")]
    EquipmentDelete,

    #[strum(serialize = "simulations:view")]
    SimulationsView,
    #[strum(serialize = "simulations:create")]
    SimulationsCreate,
    #[strum(serialize = "simulations:edit")]
    SimulationsEdit,
    #[strum(serialize = "simulations:delete")]
    SimulationsDelete,

    #[strum(serialize = "orders:view")]
    OrdersView,
    #[strum(serialize = "orders:create")]
    OrdersCreate,
    #[strum(serialize = "orders:edit")]
    OrdersEdit,
    #[strum(serialize = "orders:delete")]
    OrdersDelete,

    /// 查看用户的个别授权
    #[strum(serialize = "permissions:view")]
    PermissionsView,
    /// 维护用户的个别授权
    #[strum(serialize = "permissions:manage")]
    PermissionsManage,
}

impl Permission {
    /// 权限代码，例如 `orders:create`
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// 资源部分
    pub fn resource(self) -> &'static str {
        self.split().0
    }

    /// 操作部分
    pub fn action(self) -> &'static str {
        self.split().1
    }

    fn split(self) -> (&'static str, &'static str) {
        // 目录中每个代码都包含且仅包含一个 ':'
        self.as_str().split_once(':').unwrap_or((self.as_str(), ""))
    }

    /// 遍历整个目录
    pub fn all() -> impl Iterator<Item = Permission> {
        Self::iter()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Permission {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map_err(|_| AccessError::UnknownPermission(value))
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.as_str().to_string()
    }
}

/// 判断权限代码是否在目录中
pub fn is_valid_permission(id: &str) -> bool {
    id.parse::<Permission>().is_ok()
}

/// 目录条目 (对外展示用)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub code: &'static str,
    pub resource: &'static str,
    pub action: &'static str,
}

impl From<Permission> for CatalogEntry {
    fn from(permission: Permission) -> Self {
        Self {
            code: permission.as_str(),
            resource: permission.resource(),
            action: permission.action(),
        }
    }
}

/// 列出整个目录
pub fn catalog() -> Vec<CatalogEntry> {
    Permission::all().map(CatalogEntry::from).collect()
}
