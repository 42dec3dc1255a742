//! 认证能力：access token / refresh token 双令牌会话、角色授权与账户流程。
//!
//! 会话模型：
//! - 登录/注册时创建一条 refresh token 记录（服务端持久化，绝对过期时间）
//! - access token 内嵌记录 id（`refreshToken`）与记录当前的 nonce（`tkId`）
//! - 每次 refresh 原地轮换记录的 nonce，旧 access token 立即失效
//! - 登出删除记录，所有绑定它的 access token 失效

mod accounts;
mod clock;
mod jwt;
mod password;
mod users;

use domain::{AuthCheck, RequestContext, Role};
use quill_config::{DEFAULT_ACCESS_TOKEN_TTL_SECONDS, DEFAULT_REFRESH_TOKEN_TTL_SECONDS};
use quill_storage::{
    AdminRecord, AdminStore, BlacklistStore, CredentialStore, NewRefreshToken,
    RefreshTokenRecord, StorageError, UserRecord, UserStore,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub use accounts::UserRegistration;
pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::{
    AccessClaims, AccessPayload, Claims, DecodeOptions, JwtManager, SignedToken, new_token_id,
};
pub use password::{hash_password, verify_password};
pub use users::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Page, PageRequest, UserChanges};

/// 认证相关错误。
///
/// 每个变体对应固定的 HTTP 状态码与机器可读的错误类型标签。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("The authorization header is required.")]
    AuthorizationRequired,
    #[error("The provided token is invalid.")]
    TokenInvalid,
    #[error("Refresh token has expired.")]
    RefreshTokenExpired,
    #[error("Access token has expired.")]
    AccessTokenExpired,
    #[error("You are not authorized.")]
    NotAuthorized,
    #[error("Account not found.")]
    AccountNotFound,
    #[error("Token missing from request.")]
    TokenMissingFromReq,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Email is in use.")]
    EmailInUse,
    #[error("An admin account already exists, contact your system administrator.")]
    AdminExists,
    #[error("Resource not found.")]
    ResourceNotFound,
    #[error("The account must be suspended before it can be deleted.")]
    NotSuspendedAccount,
    #[error("You have been banned.")]
    UserBanned,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// 对应的 HTTP 状态码。
    pub fn status(&self) -> u16 {
        match self {
            AuthError::AuthorizationRequired
            | AuthError::TokenInvalid
            | AuthError::TokenMissingFromReq
            | AuthError::InvalidCredentials
            | AuthError::EmailInUse
            | AuthError::AdminExists
            | AuthError::NotSuspendedAccount
            | AuthError::UserBanned => 400,
            AuthError::RefreshTokenExpired
            | AuthError::AccessTokenExpired
            | AuthError::NotAuthorized => 401,
            AuthError::AccountNotFound | AuthError::ResourceNotFound => 404,
            AuthError::Internal(_) => 500,
        }
    }

    /// 机器可读的错误类型标签。
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::AuthorizationRequired => "AuthorizationRequired",
            AuthError::TokenInvalid => "TokenInvalid",
            AuthError::RefreshTokenExpired => "RefreshTokenExpired",
            AuthError::AccessTokenExpired => "AccessTokenExpired",
            AuthError::NotAuthorized => "NotAuthorized",
            AuthError::AccountNotFound => "AccountNotFound",
            AuthError::TokenMissingFromReq => "TokenMissingFromReq",
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::EmailInUse => "EmailInUse",
            AuthError::AdminExists => "AdminExists",
            AuthError::ResourceNotFound => "ResourceNotFound",
            AuthError::NotSuspendedAccount => "NotSuspendedAccount",
            AuthError::UserBanned => "UserBanned",
            AuthError::Internal(_) => "InternalError",
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// 令牌有效期配置（秒）。
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        }
    }
}

/// 认证服务依赖的存储。
#[derive(Clone)]
pub struct AuthStores {
    pub credentials: Arc<dyn CredentialStore>,
    pub admins: Arc<dyn AdminStore>,
    pub users: Arc<dyn UserStore>,
    pub blacklist: Arc<dyn BlacklistStore>,
}

/// 解析出的身份记录。
#[derive(Debug, Clone)]
pub enum Identity {
    Admin(AdminRecord),
    User(UserRecord),
}

impl Identity {
    pub fn id(&self) -> &str {
        match self {
            Identity::Admin(admin) => &admin.id,
            Identity::User(user) => &user.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Admin(_) => Role::PrimeAdmin,
            Identity::User(_) => Role::User,
        }
    }
}

/// 签发 access token 时的身份载荷。
#[derive(Debug, Clone)]
pub struct TokenPayload {
    pub id: String,
    pub role: Option<Role>,
}

impl TokenPayload {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: None,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Some(Role::PrimeAdmin),
        }
    }
}

/// `verify` 选项。
///
/// - `refresh`：允许已过期但仍正确绑定的 access token（仅 refresh 流程使用）
/// - `check`：需要做角色授权时给出检查集合；`None` 表示只校验令牌
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    pub refresh: bool,
    pub check: Option<AuthCheck>,
}

impl VerifyOptions {
    pub fn refresh() -> Self {
        Self {
            refresh: true,
            check: None,
        }
    }

    pub fn checked(check: AuthCheck) -> Self {
        Self {
            refresh: false,
            check: Some(check),
        }
    }
}

/// `verify` 成功结果。
#[derive(Debug, Clone)]
pub struct Verified {
    pub access_token: AccessClaims,
    pub refresh_token: RefreshTokenRecord,
    /// 仅在请求了角色检查时解析。
    pub identity: Option<Identity>,
}

/// 新会话：access token + 新建的 refresh token 记录。
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub expires_at: u64,
    pub refresh_token: RefreshTokenRecord,
}

/// refresh 结果：新的 access token，记录原地轮换。
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_at: u64,
    pub refresh_token: RefreshTokenRecord,
}

/// 认证服务实现（基于凭据存储 + 身份存储 + JWT）。
pub struct AuthService {
    stores: AuthStores,
    jwt: JwtManager,
    settings: AuthSettings,
}

impl AuthService {
    /// 创建认证服务实例。
    pub fn new(stores: AuthStores, jwt: JwtManager, settings: AuthSettings) -> Self {
        Self {
            stores,
            jwt,
            settings,
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// 所有受保护路由的统一校验入口。
    ///
    /// 顺序：头部存在 → 签名 → refresh 记录存在且未过期 → nonce 绑定 →
    /// access token 过期（refresh 流程放行）→ 可选的角色授权。
    pub async fn verify(
        &self,
        authorization: Option<&str>,
        options: VerifyOptions,
    ) -> Result<Verified, AuthError> {
        let result = self.verify_inner(authorization, options).await;
        if let Err(err) = &result {
            quill_telemetry::record_verify_failure();
            tracing::debug!(error_type = err.error_type(), refresh = options.refresh, "token verification failed");
        }
        result
    }

    async fn verify_inner(
        &self,
        authorization: Option<&str>,
        options: VerifyOptions,
    ) -> Result<Verified, AuthError> {
        let token = authorization
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::AuthorizationRequired)?;

        // 过期在下面手动判断，此处只校验签名与格式
        let access_token = self.jwt.verify_access(
            token,
            DecodeOptions {
                ignore_expiration: true,
            },
        )?;

        let now = self.jwt.now();
        let refresh_token = self
            .stores
            .credentials
            .find_by_id(access_token.refresh_token_id())
            .await?
            .filter(|record| !record.is_expired_at(now))
            .ok_or(AuthError::RefreshTokenExpired)?;

        if !nonce_matches(&refresh_token.token_id, access_token.token_id()) {
            return Err(AuthError::NotAuthorized);
        }

        if access_token.is_expired_at(now) && !options.refresh {
            return Err(AuthError::AccessTokenExpired);
        }

        let identity = match options.check {
            Some(check) => self.authorize(&access_token, check).await?,
            None => None,
        };

        Ok(Verified {
            access_token,
            refresh_token,
            identity,
        })
    }

    /// 角色授权。
    ///
    /// - 仅 admin：非管理员 token 直接拒绝
    /// - 包含 user：管理员 token 查管理员存储，其余查用户存储
    async fn authorize(
        &self,
        token: &AccessClaims,
        check: AuthCheck,
    ) -> Result<Option<Identity>, AuthError> {
        if check.is_empty() {
            return Ok(None);
        }
        let is_admin_token = token.role().is_admin();
        if check.is_admin_only() && !is_admin_token {
            return Err(AuthError::NotAuthorized);
        }
        self.resolve_identity(token.id(), is_admin_token)
            .await
            .map(Some)
    }

    async fn resolve_identity(&self, id: &str, admin: bool) -> Result<Identity, AuthError> {
        if admin {
            self.stores
                .admins
                .find_by_id(id)
                .await?
                .map(Identity::Admin)
                .ok_or(AuthError::AccountNotFound)
        } else {
            self.stores
                .users
                .find_by_id(id)
                .await?
                .map(Identity::User)
                .ok_or(AuthError::AccountNotFound)
        }
    }

    /// 用仍正确绑定（可已过期）的 access token 换取新 token。
    ///
    /// 记录的 `token_id` 原地轮换，`expires_at` 不变：refresh 不延长会话。
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<RefreshedToken, AuthError> {
        let Verified {
            access_token,
            mut refresh_token,
            ..
        } = self.verify(authorization, VerifyOptions::refresh()).await?;

        let token_id = new_token_id();
        let payload = AccessPayload {
            id: refresh_token.user.clone(),
            role: access_token.payload.role.clone(),
            token_id: token_id.clone(),
            refresh_token: refresh_token.id.clone(),
        };
        let signed = self.jwt.sign(&payload, self.settings.access_ttl_seconds)?;

        refresh_token.token_id = token_id;
        refresh_token.updated_at = signed.issued_at;
        // 与登出或过期清理并发时记录可能已不存在
        if !self.stores.credentials.save(&refresh_token).await? {
            return Err(AuthError::RefreshTokenExpired);
        }

        quill_telemetry::record_token_refreshed();
        tracing::info!(user = %refresh_token.user, session = %refresh_token.id, "access token refreshed");

        Ok(RefreshedToken {
            access_token: signed.token,
            expires_at: signed.expires_at,
            refresh_token,
        })
    }

    /// 建立新会话（注册/登录时调用）。
    pub async fn create(
        &self,
        ctx: &RequestContext,
        payload: TokenPayload,
    ) -> Result<AuthTokens, AuthError> {
        let now = self.jwt.now();
        let token_id = new_token_id();
        let record = self
            .stores
            .credentials
            .create(NewRefreshToken {
                user: payload.id.clone(),
                token_id: token_id.clone(),
                expires_at: now.saturating_add(self.settings.refresh_ttl_seconds),
                created_by_ip: ctx.ip.clone(),
                created_at: now,
            })
            .await?;

        let access_payload = AccessPayload {
            id: payload.id,
            role: payload.role.map(|role| role.as_str().to_string()),
            token_id,
            refresh_token: record.id.clone(),
        };
        let signed = self
            .jwt
            .sign(&access_payload, self.settings.access_ttl_seconds)?;

        quill_telemetry::record_session_created();
        tracing::info!(
            user = %record.user,
            session = %record.id,
            ip = ctx.ip.as_deref().unwrap_or("-"),
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            "session created"
        );

        Ok(AuthTokens {
            access_token: signed.token,
            expires_at: signed.expires_at,
            refresh_token: record,
        })
    }

    /// 解析已校验 token 对应的身份记录。
    ///
    /// 签发后被删除的身份返回 `AccountNotFound`（404），而不是 401。
    pub async fn get_current_user(
        &self,
        token: Option<&AccessClaims>,
    ) -> Result<Identity, AuthError> {
        let token = token.ok_or(AuthError::TokenMissingFromReq)?;
        self.resolve_identity(token.id(), token.role().is_admin())
            .await
    }

    /// 登出：删除 token 当前绑定的 refresh 记录。重复登出不报错。
    pub async fn logout(&self, token: &AccessClaims) -> Result<bool, AuthError> {
        let removed = self
            .stores
            .credentials
            .delete_by_token_id(token.token_id())
            .await?;
        quill_telemetry::record_logout();
        tracing::info!(user = %token.id(), removed, "session closed");
        Ok(removed)
    }

    /// 来源 IP 在黑名单中时拒绝请求。
    pub async fn ensure_origin_allowed(&self, ctx: &RequestContext) -> Result<(), AuthError> {
        let Some(ip) = ctx.ip.as_deref() else {
            return Ok(());
        };
        if self.stores.blacklist.is_blocked(ip).await? {
            tracing::warn!(ip, "banned origin rejected");
            return Err(AuthError::UserBanned);
        }
        Ok(())
    }

    /// 封禁来源 IP，返回是否为新增。
    pub async fn ban_origin(&self, ip: &str) -> Result<bool, AuthError> {
        let added = self.stores.blacklist.block(ip).await?;
        tracing::info!(ip, added, "origin banned");
        Ok(added)
    }

    /// 解除封禁，返回该 IP 是否在黑名单中。
    pub async fn unban_origin(&self, ip: &str) -> Result<bool, AuthError> {
        let removed = self.stores.blacklist.unblock(ip).await?;
        tracing::info!(ip, removed, "origin unbanned");
        Ok(removed)
    }

    /// 清理过期的 refresh 记录（由定时任务调用）。
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let purged = self
            .stores
            .credentials
            .purge_expired(self.jwt.now())
            .await?;
        if purged > 0 {
            quill_telemetry::record_sessions_purged(purged);
            tracing::info!(purged, "expired refresh tokens purged");
        }
        Ok(purged)
    }
}

/// 常量时间比较 nonce。
fn nonce_matches(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}
