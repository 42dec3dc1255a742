//! Refresh token 内存存储实现
//!
//! 过期语义：
//! - 查找时按系统时间判断，过期记录视为不存在
//! - `purge_expired` 由外部定时任务调用，真正移除过期记录

use crate::error::StorageError;
use crate::models::{NewRefreshToken, RefreshTokenRecord, new_record_id, now_epoch_seconds};
use crate::traits::CredentialStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// Refresh token 内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储，按记录 id 索引。
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接移除记录（模拟外部删除）
    pub fn remove(&self, id: &str) -> bool {
        self.records
            .write()
            .map(|mut map| map.remove(id).is_some())
            .unwrap_or(false)
    }

    /// 当前记录数（包含尚未清理的过期记录）
    pub fn len(&self) -> usize {
        self.records.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 不做过期过滤地读取记录
    pub fn get_raw(&self, id: &str) -> Option<RefreshTokenRecord> {
        self.records
            .read()
            .ok()
            .and_then(|map| map.get(id).cloned())
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, record: NewRefreshToken) -> Result<RefreshTokenRecord, StorageError> {
        let created = RefreshTokenRecord {
            id: new_record_id(),
            user: record.user,
            token_id: record.token_id,
            expires_at: record.expires_at,
            created_by_ip: record.created_by_ip,
            created_at: record.created_at,
            updated_at: record.created_at,
        };
        let mut map = self
            .records
            .write()
            .map_err(|_| StorageError::new("credential store lock poisoned"))?;
        map.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let now = now_epoch_seconds();
        let map = self
            .records
            .read()
            .map_err(|_| StorageError::new("credential store lock poisoned"))?;
        Ok(map
            .get(id)
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    async fn save(&self, record: &RefreshTokenRecord) -> Result<bool, StorageError> {
        let now = now_epoch_seconds();
        let mut map = self
            .records
            .write()
            .map_err(|_| StorageError::new("credential store lock poisoned"))?;
        // 已删除或已过期的记录不能被 save 复活
        Ok(match map.get_mut(&record.id) {
            Some(existing) if !existing.is_expired_at(now) => {
                *existing = record.clone();
                true
            }
            _ => false,
        })
    }

    async fn delete_by_token_id(&self, token_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .records
            .write()
            .map_err(|_| StorageError::new("credential store lock poisoned"))?;
        let id = map
            .values()
            .find(|record| record.token_id == token_id)
            .map(|record| record.id.clone());
        Ok(match id {
            Some(id) => map.remove(&id).is_some(),
            None => false,
        })
    }

    async fn purge_expired(&self, now: u64) -> Result<u64, StorageError> {
        let mut map = self
            .records
            .write()
            .map_err(|_| StorageError::new("credential store lock poisoned"))?;
        let before = map.len();
        map.retain(|_, record| !record.is_expired_at(now));
        Ok((before - map.len()) as u64)
    }
}
