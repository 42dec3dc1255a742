//! 认证领域共享词汇：角色、授权检查集合与请求上下文。

pub mod role;

pub use role::{AuthCheck, ROLE_PRIME_ADMIN, ROLE_USER, Role};

/// 请求上下文：会话签发时记录的来源信息。
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub request_id: Option<String>,
}

impl RequestContext {
    /// 构造带来源 IP 的请求上下文。
    pub fn new(ip: Option<String>, request_id: Option<String>) -> Self {
        Self { ip, request_id }
    }

    /// 仅带 IP 的上下文（测试与后台调用使用）。
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            request_id: None,
        }
    }
}
