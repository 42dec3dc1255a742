//! 用户管理 handlers
//!
//! ## 仅管理员
//! - `GET /v1/users`：分页列表（`page`、`limit`，按创建时间降序）
//! - `GET /v1/users/:id`：单个用户
//! - `PUT /v1/users/:id/recover`：恢复已停用账户
//! - `PUT /v1/users/:id/password`：重置口令
//! - `PUT|DELETE /v1/admin/blacklist/:ip`：封禁 / 解封来源 IP
//!
//! ## 本人或管理员
//! - `PUT /v1/users/:id`：修改 email / 姓名
//! - `PUT /v1/users/:id/suspend`：停用账户
//! - `DELETE /v1/users/:id`：删除账户（本人须先停用）

use crate::AppState;
use crate::middleware::{require_admin_auth, require_auth};
use crate::utils::response::{auth_error, bad_request_error, ok, user_to_dto};
use crate::utils::validation::{check_user_password, normalize_email, normalize_required};
use api_contract::{
    AdminChangePasswordRequest, BlacklistResponse, PageQuery, PageResponse, UpdateUserRequest,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use quill_auth::{PageRequest, UserChanges};
use std::net::IpAddr;

/// 用户分页列表
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    if let Err(response) = require_admin_auth(&state, &headers).await {
        return response;
    }
    match state
        .auth
        .list_users(PageRequest::new(query.page, query.limit))
        .await
    {
        Ok(page) => ok(
            StatusCode::OK,
            PageResponse {
                items: page.items.into_iter().map(user_to_dto).collect(),
                count: page.count,
                pages: page.pages,
                page: page.page,
                limit: page.limit,
                order_by: "createdAt",
                order_dir: "desc",
            },
        ),
        Err(err) => auth_error(err),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_admin_auth(&state, &headers).await {
        return response;
    }
    match state.auth.get_user(&id).await {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}

/// 修改资料
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    let ctx = match require_auth(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let mut changes = UserChanges::default();
    if let Some(email) = req.email {
        match normalize_email(email) {
            Ok(value) => changes.email = Some(value),
            Err(response) => return response,
        }
    }
    if let Some(first_name) = req.first_name {
        match normalize_required(first_name, "firstName") {
            Ok(value) => changes.first_name = Some(value),
            Err(response) => return response,
        }
    }
    if let Some(last_name) = req.last_name {
        match normalize_required(last_name, "lastName") {
            Ok(value) => changes.last_name = Some(value),
            Err(response) => return response,
        }
    }
    match state.auth.update_user(&ctx.identity, &id, changes).await {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}

/// 停用账户
pub async fn suspend_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let ctx = match require_auth(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.auth.suspend_user(&ctx.identity, &id).await {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}

/// 恢复账户
pub async fn recover_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_admin_auth(&state, &headers).await {
        return response;
    }
    match state.auth.recover_user(&id).await {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}

/// 删除账户
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let ctx = match require_auth(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.auth.delete_user(&ctx.identity, &id).await {
        Ok(()) => ok(StatusCode::OK, true),
        Err(err) => auth_error(err),
    }
}

/// 管理员重置口令
pub async fn admin_change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AdminChangePasswordRequest>,
) -> Response {
    if let Err(response) = require_admin_auth(&state, &headers).await {
        return response;
    }
    let new_password = req.new_password.trim();
    if let Err(response) = check_user_password(new_password) {
        return response;
    }
    match state.auth.admin_change_password(&id, new_password).await {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}

fn parse_ip(ip: &str) -> Result<String, Response> {
    ip.parse::<IpAddr>()
        .map(|addr| addr.to_string())
        .map_err(|_| bad_request_error("ip must be a valid IP address"))
}

/// 封禁来源 IP
pub async fn ban_ip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ip): Path<String>,
) -> Response {
    if let Err(response) = require_admin_auth(&state, &headers).await {
        return response;
    }
    let ip = match parse_ip(&ip) {
        Ok(ip) => ip,
        Err(response) => return response,
    };
    match state.auth.ban_origin(&ip).await {
        Ok(changed) => ok(StatusCode::OK, BlacklistResponse { ip, changed }),
        Err(err) => auth_error(err),
    }
}

/// 解封来源 IP
pub async fn unban_ip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ip): Path<String>,
) -> Response {
    if let Err(response) = require_admin_auth(&state, &headers).await {
        return response;
    }
    let ip = match parse_ip(&ip) {
        Ok(ip) => ip,
        Err(response) => return response,
    };
    match state.auth.unban_origin(&ip).await {
        Ok(changed) => ok(StatusCode::OK, BlacklistResponse { ip, changed }),
        Err(err) => auth_error(err),
    }
}
