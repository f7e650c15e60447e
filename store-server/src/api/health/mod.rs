//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /health | GET | 健康检查 | 无 |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "database": "ok" }
//! ```

use axum::{Json, extract::State, routing::get};
use serde::Serialize;

use crate::auth::{GatedRouter, RouteAccess};
use crate::core::ServerState;

pub fn routes(router: GatedRouter<ServerState>) -> GatedRouter<ServerState> {
    router.route("/health", RouteAccess::Public, get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    /// ok | error
    database: &'static str,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let database = match state.db.health().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            "error"
        }
    };

    Json(HealthResponse {
        status: if database == "ok" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
