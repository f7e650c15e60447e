//! 当前调用方身份
//!
//! `CreateUser` 访问级别：subject 可能尚未注册为用户，
//! 客户端在注册流程前用它确认令牌有效。

use axum::routing::get;

use crate::auth::{AuthenticatedIdentity, GatedRouter, RouteAccess};
use crate::core::ServerState;
use crate::utils::{AppResponse, ok};

pub fn routes(router: GatedRouter<ServerState>) -> GatedRouter<ServerState> {
    router.route("/api/me", RouteAccess::CreateUser, get(me))
}

async fn me(identity: AuthenticatedIdentity) -> axum::Json<AppResponse<AuthenticatedIdentity>> {
    ok(identity)
}
