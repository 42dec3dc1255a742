//! Postgres refresh token 存储实现

use crate::error::StorageError;
use crate::models::{NewRefreshToken, RefreshTokenRecord, new_record_id, now_epoch_seconds};
use crate::traits::CredentialStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgCredentialStore {
    pub pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &PgRow) -> Result<RefreshTokenRecord, StorageError> {
    let expires_at: i64 = row.try_get("expires_at")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;
    Ok(RefreshTokenRecord {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        token_id: row.try_get("token_id")?,
        expires_at: expires_at.max(0) as u64,
        created_by_ip: row.try_get("created_by_ip")?,
        created_at: created_at.max(0) as u64,
        updated_at: updated_at.max(0) as u64,
    })
}

#[async_trait::async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, record: NewRefreshToken) -> Result<RefreshTokenRecord, StorageError> {
        let row = sqlx::query(
            "insert into refresh_tokens \
             (id, user_id, token_id, expires_at, created_by_ip, created_at, updated_at) \
             values ($1, $2, $3, $4, $5, $6, $6) \
             returning id, user_id, token_id, expires_at, created_by_ip, created_at, updated_at",
        )
        .bind(new_record_id())
        .bind(&record.user)
        .bind(&record.token_id)
        .bind(record.expires_at as i64)
        .bind(record.created_by_ip.clone())
        .bind(record.created_at as i64)
        .fetch_one(&self.pool)
        .await?;
        row_to_record(&row)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let row = sqlx::query(
            "select id, user_id, token_id, expires_at, created_by_ip, created_at, updated_at \
             from refresh_tokens where id = $1 and expires_at > $2",
        )
        .bind(id)
        .bind(now_epoch_seconds() as i64)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn save(&self, record: &RefreshTokenRecord) -> Result<bool, StorageError> {
        // 条件更新：记录已删除或已过期时不写入
        let result = sqlx::query(
            "update refresh_tokens set token_id = $2, updated_at = $3 \
             where id = $1 and expires_at > $4",
        )
        .bind(&record.id)
        .bind(&record.token_id)
        .bind(record.updated_at as i64)
        .bind(now_epoch_seconds() as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_token_id(&self, token_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from refresh_tokens where token_id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: u64) -> Result<u64, StorageError> {
        let result = sqlx::query("delete from refresh_tokens where expires_at <= $1")
            .bind(now as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
