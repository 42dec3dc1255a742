//! 数据模型
//!
//! 定义所有存储相关的数据模型：
//! - 凭据模型：RefreshTokenRecord, NewRefreshToken
//! - 身份模型：AdminRecord, NewAdmin, UserRecord, NewUser
//!
//! 所有时间戳均为 Unix 秒。

use serde::{Deserialize, Serialize};

/// 管理员记录的固定角色值。
pub const ADMIN_ROLE: &str = "prime-admin";

/// Refresh token 记录（服务端持久化的会话锚点）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub id: String,
    pub user: String,
    /// 轮换 nonce，每次 refresh 原地更新。
    pub token_id: String,
    pub expires_at: u64,
    pub created_by_ip: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl RefreshTokenRecord {
    /// 在给定时刻是否已过期（`expires_at` 当秒即失效）。
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at <= now
    }
}

/// Refresh token 创建输入（id 由存储分配）。
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user: String,
    pub token_id: String,
    pub expires_at: u64,
    pub created_by_ip: Option<String>,
    pub created_at: u64,
}

/// 管理员记录。
#[derive(Debug, Clone)]
pub struct AdminRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// 管理员创建输入。
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub password_hash: String,
}

/// 普通用户记录。
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// 已停用（用户自行删除前必须先停用）。
    pub suspended: bool,
    pub created_at: u64,
}

/// 普通用户创建输入。
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: u64,
}

/// 生成存储分配的记录 ID（32 位十六进制）。
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// 当前时间戳（秒）。
pub fn now_epoch_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
