//! 共享状态

use std::sync::Arc;

use axum::http::HeaderMap;
use metrics_exporter_prometheus::PrometheusHandle;
use sunlease_auth_core::TokenService;

use crate::application::overrides::{OverrideCommandHandler, OverrideQueryHandler};
use crate::application::{AccessGate, PermissionResolver};
use crate::domain::permission::{OverrideRepository, PermissionSource};
use crate::infrastructure::{BearerIdentity, HealthProbe};

pub type RequestGate = AccessGate<BearerIdentity, dyn PermissionSource>;

#[derive(Clone)]
pub struct AppState {
    pub resolver: PermissionResolver<dyn PermissionSource>,
    pub commands: Arc<OverrideCommandHandler<dyn OverrideRepository>>,
    pub queries: Arc<OverrideQueryHandler<dyn OverrideRepository>>,
    pub tokens: Arc<TokenService>,
    pub health: Arc<dyn HealthProbe>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        resolver: PermissionResolver<dyn PermissionSource>,
        overrides: Arc<dyn OverrideRepository>,
        tokens: Arc<TokenService>,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            resolver,
            commands: Arc::new(OverrideCommandHandler::new(Arc::clone(&overrides))),
            queries: Arc::new(OverrideQueryHandler::new(overrides)),
            tokens,
            health,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// 为当前请求构造门禁
    pub fn gate(&self, headers: &HeaderMap) -> RequestGate {
        AccessGate::new(
            BearerIdentity::from_headers(headers, Arc::clone(&self.tokens)),
            self.resolver.clone(),
        )
    }
}
