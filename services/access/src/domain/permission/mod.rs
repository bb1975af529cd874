//! 权限领域模块

pub mod catalog;
pub mod effective;
pub mod grant;
pub mod repository;
pub mod role;

pub use catalog::{CatalogEntry, Permission, catalog, is_valid_permission};
pub use effective::EffectivePermissions;
pub use grant::{PermissionGrant, PermissionSnapshot, UserPermissionOverride};
pub use repository::{OverrideRepository, PermissionSource};
pub use role::Role;
