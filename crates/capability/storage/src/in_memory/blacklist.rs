//! IP 黑名单内存存储实现

use crate::error::StorageError;
use crate::traits::BlacklistStore;
use std::collections::HashSet;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryBlacklistStore {
    ips: RwLock<HashSet<String>>,
}

impl InMemoryBlacklistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlacklistStore for InMemoryBlacklistStore {
    async fn is_blocked(&self, ip: &str) -> Result<bool, StorageError> {
        let ips = self
            .ips
            .read()
            .map_err(|_| StorageError::new("blacklist store lock poisoned"))?;
        Ok(ips.contains(ip))
    }

    async fn block(&self, ip: &str) -> Result<bool, StorageError> {
        let mut ips = self
            .ips
            .write()
            .map_err(|_| StorageError::new("blacklist store lock poisoned"))?;
        Ok(ips.insert(ip.to_string()))
    }

    async fn unblock(&self, ip: &str) -> Result<bool, StorageError> {
        let mut ips = self
            .ips
            .write()
            .map_err(|_| StorageError::new("blacklist store lock poisoned"))?;
        Ok(ips.remove(ip))
    }
}
