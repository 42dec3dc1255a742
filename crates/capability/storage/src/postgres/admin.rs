//! Postgres 管理员存储实现

use crate::error::StorageError;
use crate::models::{ADMIN_ROLE, AdminRecord, NewAdmin, new_record_id};
use crate::traits::AdminStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgAdminStore {
    pub pool: PgPool,
}

impl PgAdminStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_admin(row: &PgRow) -> Result<AdminRecord, StorageError> {
    Ok(AdminRecord {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
    })
}

#[async_trait::async_trait]
impl AdminStore for PgAdminStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<AdminRecord>, StorageError> {
        let row = sqlx::query("select id, username, password_hash, role from admins where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_admin).transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, StorageError> {
        let row = sqlx::query(
            "select id, username, password_hash, role from admins where username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_admin).transpose()
    }

    async fn create_if_none(&self, admin: NewAdmin) -> Result<Option<AdminRecord>, StorageError> {
        // admins_single_prime_admin 唯一索引保证并发下只有一条插入成功
        let row = sqlx::query(
            "insert into admins (id, username, password_hash, role) \
             select $1, $2, $3, $4 where not exists (select 1 from admins) \
             on conflict do nothing \
             returning id, username, password_hash, role",
        )
        .bind(new_record_id())
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(ADMIN_ROLE)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_admin).transpose()
    }
}
