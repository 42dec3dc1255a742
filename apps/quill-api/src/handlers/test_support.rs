//! handler 测试共用的应用构造与请求辅助函数

use crate::{AppState, build_app};
use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use quill_auth::{AuthService, AuthSettings, AuthStores, JwtManager, ManualClock};
use quill_storage::{
    InMemoryAdminStore, InMemoryBlacklistStore, InMemoryCredentialStore, InMemoryUserStore,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub fn test_app(clock: Arc<ManualClock>) -> Router {
    test_app_with_credentials(clock).0
}

/// 同时返回凭据存储，便于断言会话记录
pub fn test_app_with_credentials(clock: Arc<ManualClock>) -> (Router, Arc<InMemoryCredentialStore>) {
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let stores = AuthStores {
        credentials: credentials.clone(),
        admins: Arc::new(InMemoryAdminStore::new()),
        users: Arc::new(InMemoryUserStore::new()),
        blacklist: Arc::new(InMemoryBlacklistStore::new()),
    };
    let auth = Arc::new(AuthService::new(
        stores,
        JwtManager::new("secret", clock),
        AuthSettings::default(),
    ));
    (build_app(AppState { auth }), credentials)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_with(app, method, uri, token, body, Vec::new()).await
}

pub async fn send_with(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    headers: Vec<(&'static str, HeaderValue)>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json")
    };
    (status, value)
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// 注册普通用户，返回 (token, 用户 id)
pub async fn register_account(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "pass1234",
            "firstName": "Ada",
            "lastName": "Lovelace"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["data"]["token"].as_str().expect("token").to_string(),
        body["data"]["account"]["id"].as_str().expect("id").to_string(),
    )
}

pub async fn register_user(app: &Router) -> String {
    register_account(app, "Ada@Example.com").await.0
}

pub async fn register_admin(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/v1/auth/register-admin",
        None,
        Some(json!({ "username": "root", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["token"].as_str().expect("token").to_string()
}
