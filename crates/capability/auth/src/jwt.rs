use crate::AuthError;
use crate::clock::Clock;
use domain::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// 签名 token 的 claims：业务载荷 + 签发/过期时间（秒）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims<T> {
    #[serde(flatten)]
    pub payload: T,
    pub iat: u64,
    pub exp: u64,
}

/// Access token 载荷。
///
/// `tkId` 必须等于所绑定 refresh token 记录当前的 `token_id`，
/// `refreshToken` 是该记录的 id。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "tkId")]
    pub token_id: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// 解码后的 access token。
pub type AccessClaims = Claims<AccessPayload>;

impl Claims<AccessPayload> {
    pub fn id(&self) -> &str {
        &self.payload.id
    }

    /// 角色缺失或为 `user` 即普通账户。
    pub fn role(&self) -> Role {
        Role::from_claim(self.payload.role.as_deref())
    }

    pub fn token_id(&self) -> &str {
        &self.payload.token_id
    }

    pub fn refresh_token_id(&self) -> &str {
        &self.payload.refresh_token
    }

    /// `exp` 早于 `now` 即过期。
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.exp < now
    }
}

/// 解码选项。
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub ignore_expiration: bool,
}

/// 签名结果。
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// JWT 签发与校验（HS256，单一共享密钥）。
///
/// 过期判断使用注入的时钟，jsonwebtoken 自身的 exp 校验关闭。
pub struct JwtManager {
    secret: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl JwtManager {
    /// 创建 JWT 管理器。
    pub fn new(secret: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.into().into_bytes(),
            clock,
        }
    }

    /// 当前时间（秒）。
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// 签发：`iat = now`，`exp = now + expires_in`。
    pub fn sign<T: Serialize>(
        &self,
        payload: &T,
        expires_in_seconds: u64,
    ) -> Result<SignedToken, AuthError> {
        let issued_at = self.now();
        let expires_at = issued_at.saturating_add(expires_in_seconds);
        let claims = Claims {
            payload,
            iat: issued_at,
            exp: expires_at,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|err| AuthError::Internal(err.to_string()))?;
        Ok(SignedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// 校验签名并解码。
    ///
    /// 签名错误或格式错误返回 `TokenInvalid`；
    /// 未设置 `ignore_expiration` 且已过期返回 `AccessTokenExpired`。
    pub fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        options: DecodeOptions,
    ) -> Result<Claims<T>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let decoded = jsonwebtoken::decode::<Claims<T>>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(map_jwt_error)?;
        let claims = decoded.claims;
        if !options.ignore_expiration && claims.exp < self.now() {
            return Err(AuthError::AccessTokenExpired);
        }
        Ok(claims)
    }

    /// 解码 access token。
    pub fn verify_access(
        &self,
        token: &str,
        options: DecodeOptions,
    ) -> Result<AccessClaims, AuthError> {
        self.verify::<AccessPayload>(token, options)
    }
}

/// 生成新的 tokenId nonce。
pub fn new_token_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 将 jwt 库错误映射为业务错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::AccessTokenExpired,
        _ => AuthError::TokenInvalid,
    }
}
