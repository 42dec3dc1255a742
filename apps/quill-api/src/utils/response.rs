//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：auth_error（认证错误到状态码的唯一映射）、bad_request_error
//! - DTO 转换：user_to_dto, admin_to_dto, identity_to_dto

use api_contract::{AdminDto, ApiResponse, IdentityDto, UserDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quill_auth::{AuthError, Identity};
use quill_storage::{AdminRecord, UserRecord};

/// 认证错误响应：状态码与错误类型标签均来自 `AuthError`
pub fn auth_error(err: AuthError) -> Response {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if let AuthError::Internal(message) = &err {
        tracing::error!(error = %message, "auth internal error");
    }
    (
        status,
        Json(ApiResponse::<()>::error(err.error_type(), err.to_string())),
    )
        .into_response()
}

/// 输入校验失败响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("InputValidation", message.into())),
    )
        .into_response()
}

/// 成功响应
pub fn ok<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::success(data))).into_response()
}

pub fn user_to_dto(record: UserRecord) -> UserDto {
    UserDto {
        id: record.id,
        email: record.email,
        first_name: record.first_name,
        last_name: record.last_name,
        suspended: record.suspended,
        created_at: record.created_at,
    }
}

pub fn admin_to_dto(record: AdminRecord) -> AdminDto {
    AdminDto {
        id: record.id,
        username: record.username,
        role: record.role,
    }
}

pub fn identity_to_dto(identity: Identity) -> IdentityDto {
    match identity {
        Identity::Admin(admin) => IdentityDto::Admin(admin_to_dto(admin)),
        Identity::User(user) => IdentityDto::User(user_to_dto(user)),
    }
}
