//! API 路由模块
//!
//! 每条路由在注册时声明访问级别 ([`RouteAccess`])：
//!
//! | 路径 | 方法 | 访问级别 |
//! |------|------|---------|
//! | /health | GET | Public |
//! | /api/me | GET | CreateUser |
//! | /api/stores/{id} | GET, PUT | Authenticated |
//! | /api/stores/{id}/open | POST | Authenticated |
//! | /api/stores/{id}/close | POST | Authenticated |
//!
//! [`RouteAccess`]: crate::auth::RouteAccess

pub mod health;
pub mod me;
pub mod stores;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::GatedRouter;
use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// 组装完整的 HTTP 应用
pub fn build_app(state: &ServerState) -> Router {
    let router = GatedRouter::new(state.verifier.clone());
    let router = health::routes(router);
    let router = me::routes(router);
    let router = stores::routes(router);

    router
        .into_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}
