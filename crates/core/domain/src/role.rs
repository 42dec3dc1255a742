//! 角色与授权检查集合。

/// 普通账户角色标识。
pub const ROLE_USER: &str = "user";
/// 管理员角色标识。
pub const ROLE_PRIME_ADMIN: &str = "prime-admin";

/// 账户角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    PrimeAdmin,
}

impl Role {
    /// 从 token 中的可选角色字段解析；缺失或未知值均视为普通账户。
    pub fn from_claim(value: Option<&str>) -> Self {
        match value {
            Some(ROLE_PRIME_ADMIN) => Role::PrimeAdmin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::PrimeAdmin => ROLE_PRIME_ADMIN,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::PrimeAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 授权检查集合 `{user, admin}` 的子集。
///
/// - 仅 admin：token 必须是管理员且管理员记录存在
/// - 包含 user：管理员 token 查管理员存储，其余查用户存储
/// - 空集合：不做身份解析
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthCheck {
    user: bool,
    admin: bool,
}

impl AuthCheck {
    pub const fn new(user: bool, admin: bool) -> Self {
        Self { user, admin }
    }

    /// `{user, admin}`：任意已登录账户。
    pub const fn any() -> Self {
        Self::new(true, true)
    }

    /// `{user}`：管理员同样满足。
    pub const fn user() -> Self {
        Self::new(true, false)
    }

    /// `{admin}`：仅管理员。
    pub const fn admin() -> Self {
        Self::new(false, true)
    }

    pub fn is_admin_only(&self) -> bool {
        self.admin && !self.user
    }

    pub fn is_empty(&self) -> bool {
        !self.user && !self.admin
    }
}
