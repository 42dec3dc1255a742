//! Redis refresh token 存储实现
//!
//! 键布局：
//! - `refresh_token:{id}` → 记录 JSON，带 EX TTL（= expires_at - now）
//! - `refresh_token:by_token_id:{token_id}` → 记录 id，TTL 同上
//!
//! 过期由 Redis 原生 TTL 完成，`purge_expired` 无需做任何事。
//! `save` 通过 Lua 脚本在服务端原子完成"存在检查 + 覆盖"，
//! 与并发的 `delete_by_token_id` 交错时不会复活已删除的记录。

use crate::error::StorageError;
use crate::models::{NewRefreshToken, RefreshTokenRecord, new_record_id, now_epoch_seconds};
use crate::traits::CredentialStore;
use redis::AsyncCommands;

fn record_key(id: &str) -> String {
    format!("refresh_token:{}", id)
}

fn token_index_key(token_id: &str) -> String {
    format!("refresh_token:by_token_id:{}", token_id)
}

/// 原子轮换：记录不存在时不写入并返回 0，否则覆盖记录并迁移 token_id 索引。
///
/// KEYS[1] 记录键，KEYS[2] 新索引键；
/// ARGV[1] 记录 JSON，ARGV[2] TTL 秒数，ARGV[3] 记录 id，ARGV[4] 索引键前缀。
const SAVE_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return 0
end
local previous = cjson.decode(current)
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
redis.call('DEL', ARGV[4] .. previous['token_id'])
redis.call('SET', KEYS[2], ARGV[3], 'EX', ARGV[2])
return 1
"#;

/// 距绝对过期时间的剩余秒数；已过期返回 None。
fn remaining_ttl(expires_at: u64) -> Option<u64> {
    let now = now_epoch_seconds();
    (expires_at > now).then(|| expires_at - now)
}

/// Redis 凭据存储
pub struct RedisCredentialStore {
    client: redis::Client,
}

impl RedisCredentialStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let client =
            redis::Client::open(redis_url).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Self::new(client))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StorageError> {
        self.client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|err| StorageError::new(err.to_string()))
    }
}

#[async_trait::async_trait]
impl CredentialStore for RedisCredentialStore {
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
        let Some(ttl) = remaining_ttl(created.expires_at) else {
            return Err(StorageError::new("refresh token already expired"));
        };
        let data = serde_json::to_string(&created)?;
        let mut connection = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .set_ex(record_key(&created.id), data, ttl)
            .ignore()
            .set_ex(token_index_key(&created.token_id), &created.id, ttl)
            .ignore()
            .query_async(&mut connection)
            .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let mut connection = self.connection().await?;
        let data: Option<String> = connection.get(record_key(id)).await?;
        let Some(data) = data else {
            return Ok(None);
        };
        let record: RefreshTokenRecord = serde_json::from_str(&data)?;
        Ok(Some(record))
    }

    async fn save(&self, record: &RefreshTokenRecord) -> Result<bool, StorageError> {
        let Some(ttl) = remaining_ttl(record.expires_at) else {
            return Ok(false);
        };
        let data = serde_json::to_string(record)?;
        let mut connection = self.connection().await?;
        let saved: i64 = redis::Script::new(SAVE_SCRIPT)
            .key(record_key(&record.id))
            .key(token_index_key(&record.token_id))
            .arg(data)
            .arg(ttl)
            .arg(&record.id)
            .arg(token_index_key(""))
            .invoke_async(&mut connection)
            .await?;
        Ok(saved == 1)
    }

    async fn delete_by_token_id(&self, token_id: &str) -> Result<bool, StorageError> {
        let mut connection = self.connection().await?;
        let id: Option<String> = connection.get(token_index_key(token_id)).await?;
        let Some(id) = id else {
            return Ok(false);
        };
        let (removed, _): (u64, u64) = redis::pipe()
            .atomic()
            .del(record_key(&id))
            .del(token_index_key(token_id))
            .query_async(&mut connection)
            .await?;
        Ok(removed > 0)
    }

    async fn purge_expired(&self, _now: u64) -> Result<u64, StorageError> {
        Ok(0)
    }
}
