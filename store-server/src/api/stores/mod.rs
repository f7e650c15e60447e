//! Store API Module
//!
//! 运营方对店铺的手动操作：读取、配置更新、手动开关店。

mod handler;

use axum::routing::{get, post};

use crate::auth::{GatedRouter, RouteAccess};
use crate::core::ServerState;

pub fn routes(router: GatedRouter<ServerState>) -> GatedRouter<ServerState> {
    router
        .route(
            "/api/stores/{id}",
            RouteAccess::Authenticated,
            get(handler::get).put(handler::update),
        )
        .route(
            "/api/stores/{id}/open",
            RouteAccess::Authenticated,
            post(handler::open),
        )
        .route(
            "/api/stores/{id}/close",
            RouteAccess::Authenticated,
            post(handler::close),
        )
}
