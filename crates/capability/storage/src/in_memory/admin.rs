//! 管理员内存存储实现

use crate::error::StorageError;
use crate::models::{ADMIN_ROLE, AdminRecord, NewAdmin, new_record_id};
use crate::traits::AdminStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 管理员内存存储，按 id 索引。
#[derive(Default)]
pub struct InMemoryAdminStore {
    admins: RwLock<HashMap<String, AdminRecord>>,
}

impl InMemoryAdminStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以指定 id 插入管理员
    pub fn insert(&self, record: AdminRecord) {
        if let Ok(mut map) = self.admins.write() {
            map.insert(record.id.clone(), record);
        }
    }

    /// 删除管理员，返回记录是否存在
    pub fn remove(&self, id: &str) -> bool {
        self.admins
            .write()
            .map(|mut map| map.remove(id).is_some())
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl AdminStore for InMemoryAdminStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<AdminRecord>, StorageError> {
        Ok(self.admins.read().ok().and_then(|map| map.get(id).cloned()))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, StorageError> {
        Ok(self.admins.read().ok().and_then(|map| {
            map.values()
                .find(|admin| admin.username == username)
                .cloned()
        }))
    }

    async fn create_if_none(&self, admin: NewAdmin) -> Result<Option<AdminRecord>, StorageError> {
        let mut map = self
            .admins
            .write()
            .map_err(|_| StorageError::new("admin store lock poisoned"))?;
        if !map.is_empty() {
            return Ok(None);
        }
        let record = AdminRecord {
            id: new_record_id(),
            username: admin.username,
            password_hash: admin.password_hash,
            role: ADMIN_ROLE.to_string(),
        };
        map.insert(record.id.clone(), record.clone());
        Ok(Some(record))
    }
}
