//! 账户流程：注册、登录、修改口令。
//!
//! 注册和登录成功后都通过 `AuthService::create` 建立新会话。

use crate::password::{hash_password, verify_password};
use crate::{AuthError, AuthService, AuthTokens, Identity, TokenPayload};
use domain::RequestContext;
use quill_storage::{AdminRecord, NewAdmin, NewUser, UserRecord};

/// 普通用户注册输入（格式校验由 HTTP 层完成）。
#[derive(Debug, Clone)]
pub struct UserRegistration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl AuthService {
    /// 注册普通用户并建立会话。
    pub async fn register_user(
        &self,
        ctx: &RequestContext,
        input: UserRegistration,
    ) -> Result<(UserRecord, AuthTokens), AuthError> {
        if self
            .stores
            .users
            .find_by_email(&input.email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailInUse);
        }
        let password_hash = hash_password(&input.password)?;
        let user = self
            .stores
            .users
            .create(NewUser {
                email: input.email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                created_at: self.jwt.now(),
            })
            .await?;
        let tokens = self.create(ctx, TokenPayload::user(&user.id)).await?;
        Ok((user, tokens))
    }

    /// 注册 prime-admin；系统中已有管理员时拒绝。
    pub async fn register_admin(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<(AdminRecord, AuthTokens), AuthError> {
        let password_hash = hash_password(password)?;
        let admin = self
            .stores
            .admins
            .create_if_none(NewAdmin {
                username: username.to_string(),
                password_hash,
            })
            .await?
            .ok_or(AuthError::AdminExists)?;
        let tokens = self.create(ctx, TokenPayload::admin(&admin.id)).await?;
        Ok((admin, tokens))
    }

    /// 普通用户登录（email + 口令）。
    pub async fn login_user(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, AuthTokens), AuthError> {
        let user = self
            .stores
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&user.password_hash, password)? {
            tracing::warn!(user = %user.id, "user login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        let tokens = self.create(ctx, TokenPayload::user(&user.id)).await?;
        Ok((user, tokens))
    }

    /// 管理员登录（用户名 + 口令）。
    pub async fn login_admin(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<(AdminRecord, AuthTokens), AuthError> {
        let admin = self
            .stores
            .admins
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&admin.password_hash, password)? {
            tracing::warn!(admin = %admin.id, "admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        let tokens = self.create(ctx, TokenPayload::admin(&admin.id)).await?;
        Ok((admin, tokens))
    }

    /// 修改口令，仅适用于普通用户；管理员身份在用户存储中不存在。
    pub async fn change_password(
        &self,
        identity: &Identity,
        current_password: &str,
        new_password: &str,
    ) -> Result<UserRecord, AuthError> {
        let Identity::User(user) = identity else {
            return Err(AuthError::AccountNotFound);
        };
        let mut user = self
            .stores
            .users
            .find_by_id(&user.id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        if !verify_password(&user.password_hash, current_password)? {
            return Err(AuthError::InvalidCredentials);
        }
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
        Ok(user)
    }
}
