//! Postgres IP 黑名单存储实现

use crate::error::StorageError;
use crate::models::now_epoch_seconds;
use crate::traits::BlacklistStore;
use sqlx::PgPool;

pub struct PgBlacklistStore {
    pub pool: PgPool,
}

impl PgBlacklistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BlacklistStore for PgBlacklistStore {
    async fn is_blocked(&self, ip: &str) -> Result<bool, StorageError> {
        let blocked: bool =
            sqlx::query_scalar("select exists(select 1 from blacklist where ip = $1)")
                .bind(ip)
                .fetch_one(&self.pool)
                .await?;
        Ok(blocked)
    }

    async fn block(&self, ip: &str) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "insert into blacklist (ip, created_at) values ($1, $2) on conflict (ip) do nothing",
        )
        .bind(ip)
        .bind(now_epoch_seconds() as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unblock(&self, ip: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from blacklist where ip = $1")
            .bind(ip)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
