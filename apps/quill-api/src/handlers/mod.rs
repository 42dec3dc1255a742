//! Handlers 模块

pub mod auth;
pub mod health;
pub mod users;

#[cfg(test)]
mod test_support;

pub use auth::*;
pub use health::*;
pub use users::*;
