//! 输入验证辅助函数
//!
//! 验证失败统一返回 400 + `InputValidation`。

use crate::utils::response::bad_request_error;
use axum::response::Response;

const USER_PASSWORD_MIN: usize = 4;
const USER_PASSWORD_MAX: usize = 20;
const ADMIN_PASSWORD_MIN: usize = 10;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 邮箱：必填且包含 `@`，统一转小写
pub fn normalize_email(value: String) -> Result<String, Response> {
    let email = normalize_required(value, "email")?;
    let valid = email
        .split_once('@')
        .is_some_and(|(local, host)| !local.is_empty() && !host.is_empty());
    if !valid {
        return Err(bad_request_error("email must be a valid email address"));
    }
    Ok(email.to_lowercase())
}

/// 普通用户口令长度 4..=20
pub fn check_user_password(password: &str) -> Result<(), Response> {
    let len = password.chars().count();
    if !(USER_PASSWORD_MIN..=USER_PASSWORD_MAX).contains(&len) {
        return Err(bad_request_error(format!(
            "password must be {USER_PASSWORD_MIN} to {USER_PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

/// 管理员口令至少 10 个字符
pub fn check_admin_password(password: &str) -> Result<(), Response> {
    if password.chars().count() < ADMIN_PASSWORD_MIN {
        return Err(bad_request_error(format!(
            "password must be at least {ADMIN_PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}
