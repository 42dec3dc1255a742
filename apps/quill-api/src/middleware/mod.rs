//! 中间件与认证辅助函数

pub mod auth;

pub use auth::*;
