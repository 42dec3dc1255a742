//! 用户管理：分页列表、资料修改、停用/恢复、删除与管理员重置口令。
//!
//! 权限约定：
//! - 列表、查询、恢复、重置口令只允许管理员（由 HTTP 层的 admin 检查保证）
//! - 修改、停用、删除允许本人或管理员
//! - 本人删除前必须先停用，管理员可直接删除

use crate::password::hash_password;
use crate::{AuthError, AuthService, Identity};
use quill_storage::UserRecord;

/// 默认每页条数。
pub const DEFAULT_PAGE_LIMIT: u64 = 15;
/// 每页条数上限。
pub const MAX_PAGE_LIMIT: u64 = 100;

/// 分页请求，页码从 1 开始。
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// 页码至少为 1，条数限制在 `1..=MAX_PAGE_LIMIT`。
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// 分页结果。
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub pages: u64,
    pub page: u64,
    pub limit: u64,
}

/// 资料修改，`None` 字段保持不变。
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn ensure_self_or_admin(actor: &Identity, user_id: &str) -> Result<(), AuthError> {
    match actor {
        Identity::Admin(_) => Ok(()),
        Identity::User(user) if user.id == user_id => Ok(()),
        Identity::User(_) => Err(AuthError::NotAuthorized),
    }
}

impl AuthService {
    /// 按创建时间降序分页列出用户；超出范围的页返回空列表。
    pub async fn list_users(&self, request: PageRequest) -> Result<Page<UserRecord>, AuthError> {
        let items = self
            .stores
            .users
            .list(request.offset(), request.limit)
            .await?;
        let count = self.stores.users.count().await?;
        Ok(Page {
            items,
            count,
            pages: count.div_ceil(request.limit).max(1),
            page: request.page,
            limit: request.limit,
        })
    }

    pub async fn get_user(&self, id: &str) -> Result<UserRecord, AuthError> {
        self.stores
            .users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// 修改 email 或姓名；新 email 被其他账户占用时返回 `EmailInUse`。
    pub async fn update_user(
        &self,
        actor: &Identity,
        id: &str,
        changes: UserChanges,
    ) -> Result<UserRecord, AuthError> {
        ensure_self_or_admin(actor, id)?;
        let mut user = self
            .stores
            .users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::ResourceNotFound)?;

        if let Some(email) = changes.email {
            let taken = self
                .stores
                .users
                .find_by_email(&email)
                .await?
                .is_some_and(|other| other.id != user.id);
            if taken {
                return Err(AuthError::EmailInUse);
            }
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }

        if !self.stores.users.update(&user).await? {
            return Err(AuthError::ResourceNotFound);
        }
        tracing::info!(user = %user.id, actor = %actor.id(), "user profile updated");
        Ok(user)
    }

    /// 停用账户（本人或管理员）。
    pub async fn suspend_user(&self, actor: &Identity, id: &str) -> Result<UserRecord, AuthError> {
        ensure_self_or_admin(actor, id)?;
        let user = self.set_suspended(id, true).await?;
        tracing::info!(user = %user.id, actor = %actor.id(), "user suspended");
        Ok(user)
    }

    /// 恢复已停用的账户（仅管理员）。
    pub async fn recover_user(&self, id: &str) -> Result<UserRecord, AuthError> {
        let user = self.set_suspended(id, false).await?;
        tracing::info!(user = %user.id, "user recovered");
        Ok(user)
    }

    async fn set_suspended(&self, id: &str, suspended: bool) -> Result<UserRecord, AuthError> {
        let mut user = self.get_user(id).await?;
        user.suspended = suspended;
        if !self.stores.users.update(&user).await? {
            return Err(AuthError::AccountNotFound);
        }
        Ok(user)
    }

    /// 删除账户：管理员可直接删除，本人只能删除已停用的账户。
    pub async fn delete_user(&self, actor: &Identity, id: &str) -> Result<(), AuthError> {
        ensure_self_or_admin(actor, id)?;
        let user = self.get_user(id).await?;
        if matches!(actor, Identity::User(_)) && !user.suspended {
            return Err(AuthError::NotSuspendedAccount);
        }
        if !self.stores.users.delete(&user.id).await? {
            return Err(AuthError::AccountNotFound);
        }
        tracing::info!(user = %user.id, actor = %actor.id(), "user deleted");
        Ok(())
    }

    /// 管理员重置用户口令，不需要旧口令。
    pub async fn admin_change_password(
        &self,
        id: &str,
        new_password: &str,
    ) -> Result<UserRecord, AuthError> {
        let mut user = self.get_user(id).await?;
        let password_hash = hash_password(new_password)?;
        if !self
            .stores
            .users
            .update_password_hash(&user.id, &password_hash)
            .await?
        {
            return Err(AuthError::AccountNotFound);
        }
        user.password_hash = password_hash;
        tracing::info!(user = %user.id, "user password reset by admin");
        Ok(user)
    }
}
