//! # Quill Storage 模块
//!
//! 本模块为认证能力提供统一的存储抽象层，支持多种存储后端实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：凭据、身份与 IP 黑名单的异步 Trait 接口
//! 2. **数据模型层** (`models.rs`)：refresh token、管理员、用户记录
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory/`：内存存储实现（测试与无数据库运行）
//!    - `postgres/`：PostgreSQL 存储实现（生产环境使用）
//!    - `redis`：基于原生 TTL 的凭据存储
//!
//! ## 凭据存储的过期约定
//!
//! 每条 refresh token 记录带绝对过期时间 `expires_at`。过期后查找必须表现为
//! "不存在"，与被删除不可区分：
//!
//! | 后端 | 查找时 | 物理清理 |
//! |------|--------|----------|
//! | 内存 | 过滤 `expires_at <= now` | `purge_expired` 定时任务 |
//! | PostgreSQL | `where expires_at > now` | `purge_expired` 定时任务 |
//! | Redis | 键 TTL 自动失效 | 无需 |
//!
//! 认证服务本身仍会再比较一次 `expires_at`，以容忍清理延迟。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use quill_storage::{CredentialStore, InMemoryCredentialStore, NewRefreshToken};
//!
//! let store = InMemoryCredentialStore::new();
//! let record = store
//!     .create(NewRefreshToken {
//!         user: "u1".to_string(),
//!         token_id: "nonce-1".to_string(),
//!         expires_at: now + 43_200,
//!         created_by_ip: Some("127.0.0.1".to_string()),
//!         created_at: now,
//!     })
//!     .await?;
//! let found = store.find_by_id(&record.id).await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod redis;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use self::redis::RedisCredentialStore;
pub use traits::*;

pub use in_memory::{
    InMemoryAdminStore, InMemoryBlacklistStore, InMemoryCredentialStore, InMemoryUserStore,
};

pub use postgres::{PgAdminStore, PgBlacklistStore, PgCredentialStore, PgUserStore};
