//! 路由访问级别
//!
//! 每条路由在注册时显式声明所需的访问级别，由 [`GatedRouter`] 为需要身份的
//! 路由挂载认证中间件。

use std::fmt;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::MethodRouter;
use serde::Serialize;

use super::middleware::{GateState, require_identity};
use super::verifier::IdentityVerifier;

/// 路由所需的访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    /// 无需令牌
    Public,
    /// 需要已验证的身份
    Authenticated,
    /// 需要已验证的身份，subject 可能尚未注册为用户
    CreateUser,
}

impl RouteAccess {
    pub fn requires_identity(self) -> bool {
        !matches!(self, RouteAccess::Public)
    }
}

impl fmt::Display for RouteAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteAccess::Public => write!(f, "public"),
            RouteAccess::Authenticated => write!(f, "authenticated"),
            RouteAccess::CreateUser => write!(f, "create_user"),
        }
    }
}

/// 按路由声明访问级别的 Router 构建器
///
/// ```ignore
/// let router = GatedRouter::new(verifier)
///     .route("/health", RouteAccess::Public, get(health))
///     .route("/api/stores/{id}", RouteAccess::Authenticated, get(get_store))
///     .into_router();
/// ```
pub struct GatedRouter<S = ()> {
    router: Router<S>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl<S> GatedRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            router: Router::new(),
            verifier,
        }
    }

    /// 注册路由；非 `Public` 路由只在匹配后才经过认证 (`route_layer`)
    pub fn route(
        mut self,
        path: &str,
        access: RouteAccess,
        method_router: MethodRouter<S>,
    ) -> Self {
        let method_router = if access.requires_identity() {
            let gate = GateState {
                verifier: self.verifier.clone(),
                access,
            };
            method_router.route_layer(middleware::from_fn_with_state(gate, require_identity))
        } else {
            method_router
        };

        tracing::debug!(path = %path, access = %access, "Route registered");
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn into_router(self) -> Router<S> {
        self.router
    }
}
