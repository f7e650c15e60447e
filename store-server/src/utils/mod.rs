//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型
//! - [`AppResponse`] - API 响应结构
//! - 日志、营业时间、输入校验等工具

pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult, ok};
