//! # PostgreSQL 存储实现模块
//!
//! 本模块提供认证相关存储接口的 PostgreSQL 实现，用于生产环境。
//!
//! ## 包含的实现
//!
//! - **CredentialStore** (`refresh_token.rs`)：refresh token 记录，查找时过滤已过期记录
//! - **AdminStore** (`admin.rs`)：管理员身份
//! - **UserStore** (`user.rs`)：普通用户身份
//! - **BlacklistStore** (`blacklist.rs`)：IP 黑名单
//!
//! ## 数据库模式要求
//!
//! 见 `migrations/0001_auth.sql`：
//! - `admins`：(id, username unique, password_hash, role)，role 上的部分唯一索引限制只有一个 prime-admin
//! - `users`：(id, email unique, password_hash, first_name, last_name, suspended, created_at)
//! - `blacklist`：(ip primary key, created_at)
//! - `refresh_tokens`：(id, user_id, token_id, expires_at, created_by_ip, created_at, updated_at)
//!
//! 所有时间戳列为 `BIGINT`（Unix 秒）。
//!
//! ## 过期清理
//!
//! PostgreSQL 没有文档级 TTL，查找时以 `expires_at > now` 过滤，
//! 物理删除由 `purge_expired` 完成（API 进程内定时调用）。

pub mod admin;
pub mod blacklist;
pub mod refresh_token;
pub mod user;

pub use admin::*;
pub use blacklist::*;
pub use refresh_token::*;
pub use user::*;
