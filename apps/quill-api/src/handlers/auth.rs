//! 认证相关 handlers
//!
//! ## 公开端点
//! - `POST /v1/auth/register`：普通用户注册，返回 201 + access token
//! - `POST /v1/auth/register-admin`：注册 prime-admin（系统内只允许一个）
//! - `POST /v1/auth/login` / `POST /v1/auth/login-admin`：登录
//! - `GET|POST /v1/auth/refresh-token`：用仍绑定（可已过期）的 access token 换新
//!
//! ## 私有端点（Authorization 头携带 access token）
//! - `POST /v1/auth/logout`：删除会话
//! - `GET /v1/auth/current-user`：当前身份
//! - `POST /v1/auth/change-password`：修改口令（普通用户）
//!
//! ## 会话模型
//! 登录/注册只向客户端返回 access token；refresh token 记录留在服务端，
//! 其 id 内嵌在 access token 中。每次 refresh 轮换记录的 nonce，
//! 之前签发的 access token 随即失效。

use crate::AppState;
use crate::middleware::{authorization, current_user, require_auth, require_user_role_auth};
use crate::utils::response::{admin_to_dto, auth_error, identity_to_dto, ok, user_to_dto};
use crate::utils::validation::{
    check_admin_password, check_user_password, normalize_email, normalize_required,
};
use api_contract::{
    ChangePasswordRequest, LoginAdminRequest, LoginRequest, RefreshTokenResponse,
    RegisterAdminRequest, RegisterRequest, TokenResponse,
};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use domain::RequestContext;
use quill_auth::UserRegistration;

fn request_context(ctx: Option<Extension<RequestContext>>) -> RequestContext {
    ctx.map(|Extension(ctx)| ctx).unwrap_or_default()
}

/// 普通用户注册
pub async fn register(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let email = match normalize_email(req.email) {
        Ok(value) => value,
        Err(response) => return response,
    };
    if let Err(response) = check_user_password(&req.password) {
        return response;
    }
    let first_name = match normalize_required(req.first_name, "firstName") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let last_name = match normalize_required(req.last_name, "lastName") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let input = UserRegistration {
        email,
        password: req.password,
        first_name,
        last_name,
    };
    match state.auth.register_user(&request_context(ctx), input).await {
        Ok((user, tokens)) => ok(
            StatusCode::CREATED,
            TokenResponse {
                token: tokens.access_token,
                expires_at: tokens.expires_at,
                account: user_to_dto(user),
            },
        ),
        Err(err) => auth_error(err),
    }
}

/// 管理员注册
pub async fn register_admin(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
    Json(req): Json<RegisterAdminRequest>,
) -> Response {
    let username = match normalize_required(req.username, "username") {
        Ok(value) => value,
        Err(response) => return response,
    };
    if let Err(response) = check_admin_password(&req.password) {
        return response;
    }
    match state
        .auth
        .register_admin(&request_context(ctx), &username, &req.password)
        .await
    {
        Ok((admin, tokens)) => ok(
            StatusCode::CREATED,
            TokenResponse {
                token: tokens.access_token,
                expires_at: tokens.expires_at,
                account: admin_to_dto(admin),
            },
        ),
        Err(err) => auth_error(err),
    }
}

/// 普通用户登录
pub async fn login(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let email = match normalize_email(req.email) {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state
        .auth
        .login_user(&request_context(ctx), &email, &req.password)
        .await
    {
        Ok((user, tokens)) => ok(
            StatusCode::OK,
            TokenResponse {
                token: tokens.access_token,
                expires_at: tokens.expires_at,
                account: user_to_dto(user),
            },
        ),
        Err(err) => auth_error(err),
    }
}

/// 管理员登录
pub async fn login_admin(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
    Json(req): Json<LoginAdminRequest>,
) -> Response {
    let username = match normalize_required(req.username, "username") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state
        .auth
        .login_admin(&request_context(ctx), &username, &req.password)
        .await
    {
        Ok((admin, tokens)) => ok(
            StatusCode::OK,
            TokenResponse {
                token: tokens.access_token,
                expires_at: tokens.expires_at,
                account: admin_to_dto(admin),
            },
        ),
        Err(err) => auth_error(err),
    }
}

/// 刷新 access token
///
/// 请求头携带当前 access token（允许已过期）；成功后旧 token 立即失效。
pub async fn refresh_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.auth.refresh(authorization(&headers).as_deref()).await {
        Ok(refreshed) => ok(
            StatusCode::OK,
            RefreshTokenResponse {
                access_token: refreshed.access_token,
                expires_at: refreshed.expires_at,
            },
        ),
        Err(err) => auth_error(err),
    }
}

/// 登出
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match require_auth(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.auth.logout(&ctx.access_token).await {
        Ok(_) => ok(StatusCode::OK, true),
        Err(err) => auth_error(err),
    }
}

/// 当前身份
pub async fn get_current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_user(&state, &headers).await {
        Ok(ctx) => ok(StatusCode::OK, identity_to_dto(ctx.identity)),
        Err(response) => response,
    }
}

/// 修改口令
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Response {
    let ctx = match require_user_role_auth(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if let Err(response) = check_user_password(&req.new_password) {
        return response;
    }
    match state
        .auth
        .change_password(&ctx.identity, &req.current_password, &req.new_password)
        .await
    {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}
