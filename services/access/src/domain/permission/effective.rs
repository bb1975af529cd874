//! 有效权限集合
//!
//! 叠加规则:
//! 1. 从角色默认授权中 `granted = true` 的权限开始
//! 2. 按顺序应用个别授权: `true` 加入，`false` 移除 (即使原本不存在)
//! 3. 不在目录中的权限代码一律丢弃
//!
//! 同一权限出现多条个别授权时按顺序覆盖，最后一条生效。

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use super::catalog::Permission;
use super::grant::PermissionGrant;

/// 一次解析得到的有效权限集合，不跨请求复用
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectivePermissions(HashSet<Permission>);

impl EffectivePermissions {
    /// 空集合 (拒绝一切)
    pub fn empty() -> Self {
        Self(HashSet::new())
    }

    /// 在角色默认授权之上叠加个别授权
    pub fn overlay(role_defaults: &[PermissionGrant], overrides: &[PermissionGrant]) -> Self {
        let mut granted = HashSet::new();

        for grant in role_defaults.iter().filter(|g| g.granted) {
            if let Some(permission) = known(grant, "role_default") {
                granted.insert(permission);
            }
        }

        for grant in overrides {
            let Some(permission) = known(grant, "override") else {
                continue;
            };
            if grant.granted {
                granted.insert(permission);
            } else {
                granted.remove(&permission);
            }
        }

        Self(granted)
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// 按目录顺序排列 (用于输出)
    pub fn to_sorted_vec(&self) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = self.0.iter().copied().collect();
        permissions.sort();
        permissions
    }
}

impl FromIterator<Permission> for EffectivePermissions {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn known(grant: &PermissionGrant, source: &'static str) -> Option<Permission> {
    match grant.permission.parse() {
        Ok(permission) => Some(permission),
        Err(_) => {
            warn!(
                permission = %grant.permission,
                source,
                "Ignoring permission code outside the catalog"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(permissions: &[Permission]) -> EffectivePermissions {
        permissions.iter().copied().collect()
    }

    #[test]
    fn test_defaults_only() {
        let defaults = vec![
            PermissionGrant::allow("sellers:view"),
            PermissionGrant::allow("simulations:view"),
            PermissionGrant::deny("orders:view"),
        ];

        let effective = EffectivePermissions::overlay(&defaults, &[]);
        assert_eq!(
            effective,
            set(&[Permission::SellersView, Permission::SimulationsView])
        );
    }

    #[test]
    fn test_override_grant_adds() {
        let effective =
            EffectivePermissions::overlay(&[], &[PermissionGrant::allow("partners:view")]);
        assert_eq!(effective, set(&[Permission::PartnersView]));
    }

    #[test]
    fn test_override_revoke_removes_default() {
        let defaults = vec![
            PermissionGrant::allow("sellers:view"),
            PermissionGrant::allow("simulations:view"),
        ];
        let overrides = vec![PermissionGrant::deny("simulations:view")];

        let effective = EffectivePermissions::overlay(&defaults, &overrides);
        assert_eq!(effective, set(&[Permission::SellersView]));
    }

    #[test]
    fn test_override_grant_beats_default_deny() {
        let defaults = vec![PermissionGrant::deny("orders:delete")];
        let overrides = vec![PermissionGrant::allow("orders:delete")];

        let effective = EffectivePermissions::overlay(&defaults, &overrides);
        assert!(effective.contains(Permission::OrdersDelete));
    }

    #[test]
    fn test_revoke_of_absent_permission_is_noop() {
        let defaults = vec![PermissionGrant::allow("customers:view")];
        let overrides = vec![PermissionGrant::deny("customers:delete")];

        let effective = EffectivePermissions::overlay(&defaults, &overrides);
        assert_eq!(effective, set(&[Permission::CustomersView]));
    }

    #[test]
    fn test_last_override_wins() {
        let overrides = vec![
            PermissionGrant::allow("equipment:edit"),
            PermissionGrant::deny("equipment:edit"),
            PermissionGrant::allow("equipment:view"),
            PermissionGrant::deny("equipment:view"),
            PermissionGrant::allow("equipment:view"),
        ];

        let effective = EffectivePermissions::overlay(&[], &overrides);
        assert_eq!(effective, set(&[Permission::EquipmentView]));
    }

    #[test]
    fn test_unknown_codes_dropped() {
        let defaults = vec![
            PermissionGrant::allow("reports:export"),
            PermissionGrant::allow("customers:view"),
        ];
        let overrides = vec![PermissionGrant::allow("legacy:admin")];

        let effective = EffectivePermissions::overlay(&defaults, &overrides);
        assert_eq!(effective, set(&[Permission::CustomersView]));
    }

    #[test]
    fn test_sorted_output_follows_catalog_order() {
        let effective = set(&[
            Permission::PermissionsView,
            Permission::CustomersView,
            Permission::OrdersCreate,
        ]);

        assert_eq!(
            effective.to_sorted_vec(),
            vec![
                Permission::CustomersView,
                Permission::OrdersCreate,
                Permission::PermissionsView,
            ]
        );
    }

    #[test]
    fn test_empty() {
        let effective = EffectivePermissions::empty();
        assert!(effective.is_empty());
        assert_eq!(effective.len(), 0);
        assert!(!effective.contains(Permission::CustomersView));
    }
}
