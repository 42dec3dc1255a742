//! 应用运行配置加载。

use std::env;

/// access token 默认有效期（秒）。
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 1800;
/// refresh token 默认有效期（秒）。
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: u64 = 43200;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 配置后使用 Postgres 身份与凭据存储，否则使用内存存储。
    pub database_url: Option<String>,
    /// 配置后 refresh token 记录改存 Redis（原生 TTL）。
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub credential_sweep_seconds: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = read_optional("QUILL_JWT_SECRET")
            .ok_or_else(|| ConfigError::Missing("QUILL_JWT_SECRET".to_string()))?;
        let access_token_ttl_seconds = read_positive_u64_with_default(
            "QUILL_ACCESS_TOKEN_TTL_SECONDS",
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
        )?;
        let refresh_token_ttl_seconds = read_positive_u64_with_default(
            "QUILL_REFRESH_TOKEN_TTL_SECONDS",
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        )?;
        let credential_sweep_seconds =
            read_positive_u64_with_default("QUILL_CREDENTIAL_SWEEP_SECONDS", 60)?;
        let http_addr =
            env::var("QUILL_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let database_url = read_optional("QUILL_DATABASE_URL");
        let redis_url = read_optional("QUILL_REDIS_URL");

        Ok(Self {
            http_addr,
            database_url,
            redis_url,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            credential_sweep_seconds,
        })
    }
}

fn read_positive_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => return Ok(default),
    };
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
