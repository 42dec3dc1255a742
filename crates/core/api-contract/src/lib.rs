//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
///
/// `code` 为机器可读的错误类型标签（如 `AccessTokenExpired`）。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 普通用户注册请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// 管理员注册请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    pub username: String,
    pub password: String,
}

/// 普通用户登录请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 管理员登录请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAdminRequest {
    pub username: String,
    pub password: String,
}

/// 修改口令请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// 管理员重置用户口令请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminChangePasswordRequest {
    pub new_password: String,
}

/// 用户资料修改请求体，缺省字段保持不变。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// 分页查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// 分页响应体，固定按创建时间降序。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub pages: u64,
    pub page: u64,
    pub limit: u64,
    pub order_by: &'static str,
    pub order_dir: &'static str,
}

/// 用户返回结构（不含口令哈希）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub suspended: bool,
    pub created_at: u64,
}

/// 管理员返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDto {
    pub id: String,
    pub username: String,
    pub role: String,
}

/// 当前身份：管理员或普通用户。
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IdentityDto {
    Admin(AdminDto),
    User(UserDto),
}

/// 登录/注册响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse<T> {
    pub token: String,
    /// access token 过期时间（Unix 秒）。
    pub expires_at: u64,
    pub account: T,
}

/// 刷新 token 响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub expires_at: u64,
}

/// IP 封禁结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistResponse {
    pub ip: String,
    pub changed: bool,
}
