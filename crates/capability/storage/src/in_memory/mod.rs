//! 内存存储实现模块
//!
//! 用于本地演示和测试（未配置数据库时 API 也使用它）。
//!
//! 包含以下实现：
//! - CredentialStore: InMemoryCredentialStore
//! - AdminStore: InMemoryAdminStore
//! - UserStore: InMemoryUserStore
//! - BlacklistStore: InMemoryBlacklistStore

pub mod admin;
pub mod blacklist;
pub mod credential;
pub mod user;

pub use admin::*;
pub use blacklist::*;
pub use credential::*;
pub use user::*;
