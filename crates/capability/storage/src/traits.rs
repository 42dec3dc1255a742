//! 存储接口 Trait 定义
//!
//! 定义认证相关的异步存储接口：
//! - CredentialStore：refresh token 记录存储
//! - AdminStore：管理员身份存储
//! - UserStore：普通用户身份存储
//! - BlacklistStore：IP 黑名单
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - "不存在" 用 `Option::None` 表达，而不是错误
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::{
    AdminRecord, NewAdmin, NewRefreshToken, NewUser, RefreshTokenRecord, UserRecord,
};
use async_trait::async_trait;

/// 凭据存储接口
///
/// 记录过期后查找必须返回 `None`，与已删除不可区分。
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 创建 refresh token 记录，返回带存储分配 id 的记录
    async fn create(&self, record: NewRefreshToken) -> Result<RefreshTokenRecord, StorageError>;

    /// 根据 id 查找记录
    async fn find_by_id(&self, id: &str) -> Result<Option<RefreshTokenRecord>, StorageError>;

    /// 持久化记录（轮换 token_id），返回记录是否仍存在
    ///
    /// 记录已被删除或已过期时返回 `false`，不得重新写入。
    async fn save(&self, record: &RefreshTokenRecord) -> Result<bool, StorageError>;

    /// 根据当前 token_id 删除记录，返回是否删除了记录
    async fn delete_by_token_id(&self, token_id: &str) -> Result<bool, StorageError>;

    /// 清理所有在 `now` 时已过期的记录，返回清理数量
    async fn purge_expired(&self, now: u64) -> Result<u64, StorageError>;
}

/// 管理员存储接口
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<AdminRecord>, StorageError>;

    async fn find_by_username(&self, username: &str)
    -> Result<Option<AdminRecord>, StorageError>;

    /// 仅在尚无任何管理员时创建，已存在时返回 `None`
    ///
    /// 检查与写入必须原子完成，系统只允许一个 prime-admin。
    async fn create_if_none(&self, admin: NewAdmin) -> Result<Option<AdminRecord>, StorageError>;
}

/// 普通用户存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StorageError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    async fn create(&self, user: NewUser) -> Result<UserRecord, StorageError>;

    /// 更新口令哈希，返回记录是否存在
    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError>;

    /// 按 `created_at` 降序分页列出用户
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;

    /// 写回 email、姓名与停用标记，返回记录是否存在
    async fn update(&self, user: &UserRecord) -> Result<bool, StorageError>;

    async fn delete(&self, id: &str) -> Result<bool, StorageError>;
}

/// IP 黑名单存储接口
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    async fn is_blocked(&self, ip: &str) -> Result<bool, StorageError>;

    /// 加入黑名单，返回是否为新增
    async fn block(&self, ip: &str) -> Result<bool, StorageError>;

    /// 移出黑名单，返回是否存在
    async fn unblock(&self, ip: &str) -> Result<bool, StorageError>;
}
