//! HTTP 处理函数

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use sunlease_common::UserId;
use sunlease_errors::AppError;

use super::error::ApiResult;
use super::state::AppState;
use crate::application::overrides::{ClearOverrideCommand, ListOverridesQuery, SetOverrideCommand};
use crate::domain::permission::{CatalogEntry, Permission, UserPermissionOverride, catalog};

#[derive(Debug, Serialize)]
pub struct MyPermissionsResponse {
    pub user_id: Option<UserId>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    pub granted: bool,
}

pub async fn health(State(state): State<AppState>) -> Response {
    let status = state.health.check().await;
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<String> {
    match state.metrics {
        Some(handle) => Ok(handle.render()),
        None => Err(AppError::not_found("Metrics are disabled").into()),
    }
}

pub async fn list_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    state.gate(&headers).require_authenticated().await?;
    Ok(Json(catalog()))
}

/// 当前用户的有效权限，匿名请求得到空列表
pub async fn my_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<MyPermissionsResponse> {
    let user_id = state.gate(&headers).current_user().await;
    let permissions = state
        .resolver
        .resolve_effective_permissions(user_id.as_ref())
        .await
        .to_sorted_vec();

    Json(MyPermissionsResponse {
        user_id,
        permissions,
    })
}

pub async fn list_overrides(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<UserPermissionOverride>>> {
    let gate = state.gate(&headers);
    let overrides = state
        .queries
        .handle_list(&gate, ListOverridesQuery { user_id })
        .await?;
    Ok(Json(overrides))
}

pub async fn set_override(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((user_id, permission)): Path<(String, String)>,
    body: Result<Json<SetOverrideRequest>, JsonRejection>,
) -> ApiResult<Json<UserPermissionOverride>> {
    let gate = state.gate(&headers);

    // 请求体错误也要先过门禁，未授权的调用方只能看到统一的拒绝
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            gate.require(Permission::PermissionsManage).await?;
            return Err(AppError::validation(rejection.body_text()).into());
        }
    };

    let record = state
        .commands
        .handle_set(
            &gate,
            SetOverrideCommand {
                user_id,
                permission,
                granted: req.granted,
            },
        )
        .await?;
    Ok(Json(record))
}

pub async fn clear_override(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((user_id, permission)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let gate = state.gate(&headers);
    state
        .commands
        .handle_clear(&gate, ClearOverrideCommand { user_id, permission })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
