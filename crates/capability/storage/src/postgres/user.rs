//! Postgres 用户存储实现
//!
//! 设计要点：
//! - email 以小写存储与查询，保证唯一性不区分大小写
//! - 口令只保存哈希
//! - 列表按 created_at 降序，同秒按 id 排序

use crate::error::StorageError;
use crate::models::{NewUser, UserRecord, new_record_id};
use crate::traits::UserStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgUserStore {
    pub pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 通过数据库 URL 建立连接池
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, suspended, created_at";

fn row_to_user(row: &PgRow) -> Result<UserRecord, StorageError> {
    let created_at: i64 = row.try_get("created_at")?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        suspended: row.try_get("suspended")?,
        created_at: created_at.max(0) as u64,
    })
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(&format!("select {USER_COLUMNS} from users where id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(&format!("select {USER_COLUMNS} from users where email = $1"))
            .bind(email.to_ascii_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        let row = sqlx::query(&format!(
            "insert into users (id, email, password_hash, first_name, last_name, created_at) \
             values ($1, $2, $3, $4, $5, $6) returning {USER_COLUMNS}"
        ))
        .bind(new_record_id())
        .bind(user.email.to_ascii_lowercase())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at as i64)
        .fetch_one(&self.pool)
        .await?;
        row_to_user(&row)
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("update users set password_hash = $2 where id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {USER_COLUMNS} from users order by created_at desc, id offset $1 limit $2"
        ))
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("select count(*) from users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn update(&self, user: &UserRecord) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "update users set email = $2, first_name = $3, last_name = $4, suspended = $5 \
             where id = $1",
        )
        .bind(&user.id)
        .bind(user.email.to_ascii_lowercase())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.suspended)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from users where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
