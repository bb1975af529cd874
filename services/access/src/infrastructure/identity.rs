//! 身份提供方实现

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use sunlease_auth_core::{TokenService, bearer_token};
use sunlease_common::UserId;
use sunlease_errors::AppResult;
use tracing::debug;

use crate::domain::IdentityProvider;

/// 从 `Authorization: Bearer <jwt>` 中识别当前用户
///
/// 令牌缺失、无效或过期都视为未登录。
pub struct BearerIdentity {
    token: Option<String>,
    tokens: Arc<TokenService>,
}

impl BearerIdentity {
    pub fn new(token: Option<String>, tokens: Arc<TokenService>) -> Self {
        Self { token, tokens }
    }

    pub fn from_headers(headers: &HeaderMap, tokens: Arc<TokenService>) -> Self {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);
        Self::new(token, tokens)
    }
}

#[async_trait]
impl IdentityProvider for BearerIdentity {
    async fn current_user(&self) -> AppResult<Option<UserId>> {
        let Some(token) = self.token.as_deref() else {
            return Ok(None);
        };

        match self.tokens.validate_access_token(token).and_then(|c| c.user_id()) {
            Ok(user_id) => Ok(Some(user_id)),
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                Ok(None)
            }
        }
    }
}

/// 固定身份 (后台任务与测试使用)
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity(pub Option<UserId>);

#[async_trait]
impl IdentityProvider for FixedIdentity {
    async fn current_user(&self) -> AppResult<Option<UserId>> {
        Ok(self.0.clone())
    }
}
