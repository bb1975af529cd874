//! 集成测试共用的内存实现

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sunlease_access::domain::permission::{
    OverrideRepository, Permission, PermissionGrant, PermissionSnapshot, PermissionSource,
    UserPermissionOverride,
};
use sunlease_common::UserId;
use sunlease_errors::{AppError, AppResult};

/// 内存版 profiles / role_permissions / user_permissions
#[derive(Default)]
pub struct InMemoryStore {
    profiles: Mutex<HashMap<UserId, Option<String>>>,
    role_defaults: Mutex<HashMap<String, Vec<PermissionGrant>>>,
    overrides: Mutex<Vec<UserPermissionOverride>>,
    /// 直接写入的原始个别授权行 (可包含目录外代码或重复行)
    raw_overrides: Mutex<HashMap<UserId, Vec<PermissionGrant>>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    loads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, role: Option<&str>) -> UserId {
        let user_id = UserId::new();
        self.profiles
            .lock()
            .unwrap()
            .insert(user_id.clone(), role.map(str::to_string));
        user_id
    }

    pub fn set_role_defaults(&self, role: &str, grants: &[(&str, bool)]) {
        self.role_defaults.lock().unwrap().insert(
            role.to_string(),
            grants
                .iter()
                .map(|(p, g)| PermissionGrant::new(*p, *g))
                .collect(),
        );
    }

    pub fn push_raw_override(&self, user_id: &UserId, permission: &str, granted: bool) {
        self.raw_overrides
            .lock()
            .unwrap()
            .entry(user_id.clone())
            .or_default()
            .push(PermissionGrant::new(permission, granted));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn stored_overrides(&self, user_id: &UserId) -> Vec<UserPermissionOverride> {
        self.overrides
            .lock()
            .unwrap()
            .iter()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PermissionSource for InMemoryStore {
    async fn load_snapshot(&self, user_id: &UserId) -> AppResult<Option<PermissionSnapshot>> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::database("connection refused"));
        }

        let Some(role) = self.profiles.lock().unwrap().get(user_id).cloned() else {
            return Ok(None);
        };

        let role_defaults = role
            .as_ref()
            .and_then(|r| self.role_defaults.lock().unwrap().get(r).cloned())
            .unwrap_or_default();

        let mut stored = self.stored_overrides(user_id);
        stored.sort_by_key(|o| o.updated_at);
        let mut overrides: Vec<PermissionGrant> = stored
            .into_iter()
            .map(|o| PermissionGrant::new(o.permission.as_str(), o.granted))
            .collect();
        if let Some(raw) = self.raw_overrides.lock().unwrap().get(user_id) {
            overrides.extend(raw.iter().cloned());
        }

        Ok(Some(PermissionSnapshot {
            role,
            role_defaults,
            overrides,
        }))
    }
}

#[async_trait]
impl OverrideRepository for InMemoryStore {
    async fn upsert(&self, record: &UserPermissionOverride) -> AppResult<()> {
        let mut overrides = self.overrides.lock().unwrap();
        overrides.retain(|o| !(o.user_id == record.user_id && o.permission == record.permission));
        overrides.push(record.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &UserId, permission: Permission) -> AppResult<bool> {
        let mut overrides = self.overrides.lock().unwrap();
        let before = overrides.len();
        overrides.retain(|o| !(&o.user_id == user_id && o.permission == permission));
        Ok(overrides.len() < before)
    }

    async fn list_by_user(&self, user_id: &UserId) -> AppResult<Vec<UserPermissionOverride>> {
        Ok(self.stored_overrides(user_id))
    }
}

/// 按常用角色默认授权初始化
pub fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.set_role_defaults(
        "admin",
        &Permission::all()
            .map(|p| (p.as_str(), true))
            .collect::<Vec<_>>(),
    );
    store.set_role_defaults(
        "seller",
        &[("sellers:view", true), ("simulations:view", true)],
    );
    store.set_role_defaults("partner", &[]);
    store.set_role_defaults("customer", &[("orders:view", true), ("orders:delete", false)]);
    store
}
