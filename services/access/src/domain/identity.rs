//! 身份提供方接口

use async_trait::async_trait;
use sunlease_common::UserId;
use sunlease_errors::AppResult;

/// 身份提供方
///
/// 给出当前请求已认证的用户；没有会话时返回 `Ok(None)`。
/// 解析器从不自行认证，只消费这里给出的身份。
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> AppResult<Option<UserId>>;
}
