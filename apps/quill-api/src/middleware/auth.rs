//! 认证和授权中间件
//!
//! 提供以下中间件和辅助函数：
//! - request_context：注入 request_id/trace_id 与请求上下文（客户端 IP）
//! - origin_guard：拒绝黑名单中的来源 IP
//! - authorization：读取 Authorization 头（原始 token，容忍 `Bearer ` 前缀）
//! - require_auth：任意已登录账户（`{user, admin}`）
//! - require_user_role_auth：普通用户检查（管理员同样满足）
//! - require_admin_auth：仅管理员
//! - current_user：校验 token 后解析当前身份
//!
//! 认证结果以 `AuthContext` 显式返回给 handler，不修改请求对象。

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use domain::{AuthCheck, RequestContext};
use quill_auth::{AccessClaims, Identity, VerifyOptions};
use quill_telemetry::new_request_ids;
use std::net::SocketAddr;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::auth_error;

/// 已认证请求的上下文。
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub access_token: AccessClaims,
    pub identity: Identity,
}

/// 请求上下文中间件：注入 request_id/trace_id 与客户端 IP
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let ip = client_ip(&req);
    req.extensions_mut()
        .insert(RequestContext::new(ip, Some(ids.request_id.clone())));

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 来源 IP 封禁检查，依赖 request_context 先注入上下文
pub async fn origin_guard(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let ctx = req
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();
    if let Err(err) = state.auth.ensure_origin_allowed(&ctx).await {
        return auth_error(err);
    }
    next.run(req).await
}

/// 客户端 IP：优先 `x-forwarded-for` 的第一个地址，其次连接对端地址。
fn client_ip(req: &Request<Body>) -> Option<String> {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    forwarded.or_else(|| {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

/// 读取 Authorization 头。
///
/// 头部值本身就是 token；带 `Bearer ` 前缀时去掉前缀。
/// 非可见 ASCII 的值按 UTF-8 有损解码后照常交给校验，由签名校验判定为无效。
pub fn authorization(headers: &HeaderMap) -> Option<String> {
    let raw = String::from_utf8_lossy(headers.get(header::AUTHORIZATION)?.as_bytes());
    let value: &str = &raw;
    Some(value.strip_prefix("Bearer ").unwrap_or(value).to_string())
}

async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    check: AuthCheck,
) -> Result<AuthContext, Response> {
    let verified = state
        .auth
        .verify(authorization(headers).as_deref(), VerifyOptions::checked(check))
        .await
        .map_err(auth_error)?;
    let identity = match verified.identity {
        Some(identity) => identity,
        None => state
            .auth
            .get_current_user(Some(&verified.access_token))
            .await
            .map_err(auth_error)?,
    };
    Ok(AuthContext {
        access_token: verified.access_token,
        identity,
    })
}

/// 任意已登录账户
pub async fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, Response> {
    authorize(state, headers, AuthCheck::any()).await
}

/// 普通用户检查，管理员 token 按管理员身份解析
pub async fn require_user_role_auth(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthContext, Response> {
    authorize(state, headers, AuthCheck::user()).await
}

/// 仅管理员
pub async fn require_admin_auth(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthContext, Response> {
    authorize(state, headers, AuthCheck::admin()).await
}

/// 校验 token（不做角色检查），再按 token 角色解析当前身份
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, Response> {
    let verified = state
        .auth
        .verify(authorization(headers).as_deref(), VerifyOptions::default())
        .await
        .map_err(auth_error)?;
    let identity = state
        .auth
        .get_current_user(Some(&verified.access_token))
        .await
        .map_err(auth_error)?;
    Ok(AuthContext {
        access_token: verified.access_token,
        identity,
    })
}
