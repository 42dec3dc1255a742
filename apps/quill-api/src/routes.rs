//! 路由定义
//!
//! - 健康检查与指标：/health, /metrics
//! - 认证接口：/v1/auth/*
//! - 用户管理：/v1/users/*
//! - IP 黑名单：/v1/admin/blacklist/:ip

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post, put},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/register-admin", post(register_admin))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/login-admin", post(login_admin))
        .route(
            "/v1/auth/refresh-token",
            get(refresh_token).post(refresh_token),
        )
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/current-user", get(get_current_user))
        .route("/v1/auth/change-password", post(change_password))
        .route("/v1/users", get(list_users))
        .route(
            "/v1/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/v1/users/:id/suspend", put(suspend_user))
        .route("/v1/users/:id/recover", put(recover_user))
        .route("/v1/users/:id/password", put(admin_change_password))
        .route("/v1/admin/blacklist/:ip", put(ban_ip).delete(unban_ip))
}
