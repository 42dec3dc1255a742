//! 用户内存存储实现
//!
//! 功能：
//! - 根据 id / email 查找用户（email 不区分大小写）
//! - 创建用户（email 唯一性由调用方先行检查）
//! - 更新口令哈希、资料与停用标记
//! - 按创建时间降序分页

use crate::error::StorageError;
use crate::models::{NewUser, UserRecord, new_record_id};
use crate::traits::UserStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 用户内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以指定 id 插入用户
    pub fn insert(&self, record: UserRecord) {
        if let Ok(mut map) = self.users.write() {
            map.insert(record.id.clone(), record);
        }
    }

    /// 删除用户，返回记录是否存在
    pub fn remove(&self, id: &str) -> bool {
        self.users
            .write()
            .map(|mut map| map.remove(id).is_some())
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.read().ok().and_then(|map| map.get(id).cloned()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.read().ok().and_then(|map| {
            map.values()
                .find(|user| user.email.eq_ignore_ascii_case(email))
                .cloned()
        }))
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        let record = UserRecord {
            id: new_record_id(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            suspended: false,
            created_at: user.created_at,
        };
        let mut map = self
            .users
            .write()
            .map_err(|_| StorageError::new("user store lock poisoned"))?;
        map.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        let mut map = self
            .users
            .write()
            .map_err(|_| StorageError::new("user store lock poisoned"))?;
        Ok(match map.get_mut(id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, StorageError> {
        let map = self
            .users
            .read()
            .map_err(|_| StorageError::new("user store lock poisoned"))?;
        let mut users: Vec<UserRecord> = map.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.users.read().map(|map| map.len() as u64).unwrap_or(0))
    }

    async fn update(&self, user: &UserRecord) -> Result<bool, StorageError> {
        let mut map = self
            .users
            .write()
            .map_err(|_| StorageError::new("user store lock poisoned"))?;
        Ok(match map.get_mut(&user.id) {
            Some(existing) => {
                existing.email = user.email.clone();
                existing.first_name = user.first_name.clone();
                existing.last_name = user.last_name.clone();
                existing.suspended = user.suspended;
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .users
            .write()
            .map_err(|_| StorageError::new("user store lock poisoned"))?;
        Ok(map.remove(id).is_some())
    }
}
