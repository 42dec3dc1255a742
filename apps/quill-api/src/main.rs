//! Quill 认证 API 服务入口。
//!
//! 启动顺序：.env → 配置 → 日志 → 存储后端 → 认证服务 → 过期会话清理任务 → HTTP。

mod handlers;
mod middleware;
mod routes;
mod utils;

use axum::{Router, middleware as axum_middleware};
use quill_auth::{AuthService, AuthSettings, AuthStores, JwtManager, SystemClock};
use quill_config::AppConfig;
use quill_storage::{
    InMemoryAdminStore, InMemoryBlacklistStore, InMemoryCredentialStore, InMemoryUserStore,
    PgAdminStore, PgBlacklistStore, PgCredentialStore, PgUserStore, RedisCredentialStore,
    StorageError, connect_pool,
};
use quill_telemetry::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    let stores = build_stores(&config).await?;
    let jwt = JwtManager::new(config.jwt_secret.clone(), Arc::new(SystemClock));
    let settings = AuthSettings {
        access_ttl_seconds: config.access_token_ttl_seconds,
        refresh_ttl_seconds: config.refresh_token_ttl_seconds,
    };
    let auth = Arc::new(AuthService::new(stores, jwt, settings));

    spawn_credential_sweep(
        auth.clone(),
        Duration::from_secs(config.credential_sweep_seconds),
    );

    let app = build_app(AppState { auth });
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!(addr = %config.http_addr, "quill-api listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// 组装路由与全局中间件。
pub fn build_app(state: AppState) -> Router {
    let origin_guard = axum_middleware::from_fn_with_state(state.clone(), middleware::origin_guard);
    routes::create_api_router()
        .with_state(state)
        .layer(origin_guard)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id 与客户端 IP
        .layer(axum_middleware::from_fn(middleware::request_context))
}

/// 按配置选择存储后端。
///
/// - 配置 `QUILL_DATABASE_URL`：身份、凭据与黑名单都存 Postgres
/// - 再配置 `QUILL_REDIS_URL`：凭据改存 Redis
/// - 都未配置：内存存储（重启即丢失）
async fn build_stores(config: &AppConfig) -> Result<AuthStores, StorageError> {
    let mut stores = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = connect_pool(database_url).await?;
            tracing::info!("using postgres identity and credential stores");
            AuthStores {
                credentials: Arc::new(PgCredentialStore::new(pool.clone())),
                admins: Arc::new(PgAdminStore::new(pool.clone())),
                users: Arc::new(PgUserStore::new(pool.clone())),
                blacklist: Arc::new(PgBlacklistStore::new(pool)),
            }
        }
        None => {
            tracing::warn!("QUILL_DATABASE_URL not set, using in-memory stores");
            AuthStores {
                credentials: Arc::new(InMemoryCredentialStore::new()),
                admins: Arc::new(InMemoryAdminStore::new()),
                users: Arc::new(InMemoryUserStore::new()),
                blacklist: Arc::new(InMemoryBlacklistStore::new()),
            }
        }
    };
    if let Some(redis_url) = config.redis_url.as_deref() {
        tracing::info!("using redis credential store");
        stores.credentials = Arc::new(RedisCredentialStore::connect(redis_url)?);
    }
    Ok(stores)
}

/// 定时清理过期 refresh token 记录。
fn spawn_credential_sweep(auth: Arc<AuthService>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(err) = auth.purge_expired_sessions().await {
                tracing::warn!(error = %err, "credential sweep failed");
            }
        }
    });
}
