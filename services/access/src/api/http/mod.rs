//! HTTP 接口 (axum)
//!
//! 只暴露授权相关的接口，业务数据的增删改查不在这里。

pub mod error;
pub mod handlers;
pub mod state;

use axum::Router;
use axum::routing::{get, put};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/permissions/catalog", get(handlers::list_catalog))
        .route("/api/me/permissions", get(handlers::my_permissions))
        .route("/api/users/{user_id}/permissions", get(handlers::list_overrides))
        .route(
            "/api/users/{user_id}/permissions/{permission}",
            put(handlers::set_override).delete(handlers::clear_override),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
