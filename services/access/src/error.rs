use sunlease_errors::AppError;
use thiserror::Error;

/// 对外统一的拒绝信息，不区分缺少权限、未登录还是数据源故障
pub const NOT_AUTHORIZED: &str = "Not authorized";

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Unknown permission: {0}")]
    UnknownPermission(String),
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
    #[error("Not authorized")]
    NotAuthorized,
}

impl From<AccessError> for AppError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::UnknownPermission(_) | AccessError::InvalidUserId(_) => {
                AppError::Validation(error.to_string())
            }
            AccessError::NotAuthorized => AppError::Forbidden(NOT_AUTHORIZED.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authorized_maps_to_forbidden() {
        let err: AppError = AccessError::NotAuthorized.into();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg == NOT_AUTHORIZED));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_unknown_permission_maps_to_validation() {
        let err: AppError = AccessError::UnknownPermission("orders:approve".to_string()).into();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("orders:approve")));
    }
}
