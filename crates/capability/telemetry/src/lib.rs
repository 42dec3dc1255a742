//! 追踪、请求 ID 与认证计数。

use serde::Serialize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 认证指标快照。
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub sessions_created: u64,
    pub tokens_refreshed: u64,
    pub verify_failures: u64,
    pub logouts: u64,
    pub sessions_purged: u64,
}

/// 认证指标。
#[derive(Default)]
pub struct TelemetryMetrics {
    sessions_created: AtomicU64,
    tokens_refreshed: AtomicU64,
    verify_failures: AtomicU64,
    logouts: AtomicU64,
    sessions_purged: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            tokens_refreshed: self.tokens_refreshed.load(Ordering::Relaxed),
            verify_failures: self.verify_failures.load(Ordering::Relaxed),
            logouts: self.logouts.load(Ordering::Relaxed),
            sessions_purged: self.sessions_purged.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录新建会话次数。
pub fn record_session_created() {
    metrics().sessions_created.fetch_add(1, Ordering::Relaxed);
}

/// 记录 access token 刷新次数。
pub fn record_token_refreshed() {
    metrics().tokens_refreshed.fetch_add(1, Ordering::Relaxed);
}

/// 记录校验失败次数。
pub fn record_verify_failure() {
    metrics().verify_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录登出次数。
pub fn record_logout() {
    metrics().logouts.fetch_add(1, Ordering::Relaxed);
}

/// 记录过期清理的会话数量。
pub fn record_sessions_purged(count: u64) {
    metrics().sessions_purged.fetch_add(count, Ordering::Relaxed);
}
