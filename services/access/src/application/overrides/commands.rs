//! 个别授权命令定义

use sunlease_common::UserId;
use sunlease_errors::AppResult;

use crate::domain::permission::Permission;
use crate::error::AccessError;

/// 设置个别授权命令 (授予或撤销)
#[derive(Debug, Clone)]
pub struct SetOverrideCommand {
    pub user_id: String,
    pub permission: String,
    pub granted: bool,
}

impl SetOverrideCommand {
    /// 验证命令参数
    pub fn validate(&self) -> AppResult<(UserId, Permission)> {
        parse_target(&self.user_id, &self.permission)
    }
}

/// 清除个别授权命令，清除后回落到角色默认授权
#[derive(Debug, Clone)]
pub struct ClearOverrideCommand {
    pub user_id: String,
    pub permission: String,
}

impl ClearOverrideCommand {
    pub fn validate(&self) -> AppResult<(UserId, Permission)> {
        parse_target(&self.user_id, &self.permission)
    }
}

pub(super) fn parse_user_id(user_id: &str) -> AppResult<UserId> {
    UserId::from_string(user_id).map_err(|_| AccessError::InvalidUserId(user_id.to_string()).into())
}

fn parse_target(user_id: &str, permission: &str) -> AppResult<(UserId, Permission)> {
    let user_id = parse_user_id(user_id)?;
    let permission = permission
        .parse::<Permission>()
        .map_err(|_| AccessError::UnknownPermission(permission.to_string()))?;
    Ok((user_id, permission))
}
