use std::sync::LazyLock;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{new_instance_id, User};
use crate::pagination::{ListOptions, ListPage};
use crate::stores::CrudSql;
use crate::traits::{StoreObject, TableMetadata};
use crate::StoreError;

const TABLE: &str = User::SCHEMA.table;

static SQL: LazyLock<CrudSql> = LazyLock::new(|| {
    CrudSql::new(
        &User::SCHEMA,
        "name",
        &["instance_id", "name", "nickname", "password", "email", "phone", "is_admin"],
        &["nickname", "password", "email", "phone", "is_admin"],
    )
});

/// Repository handle for users, borrowing the factory's pool.
/// Users are looked up by their unique `name`.
#[derive(Debug, Clone, Copy)]
pub struct UserStore<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The shared pool this handle queries
    pub fn pool(&self) -> &'a PgPool {
        self.pool
    }
}

#[async_trait]
impl<'a> StoreObject for UserStore<'a> {
    type Model = User;
    type Key = str;

    async fn create(&self, mut user: User) -> Result<User, StoreError> {
        if user.instance_id.is_empty() {
            user.instance_id = new_instance_id("user-");
        }
        crate::debug_log!(table = TABLE, instance_id = %user.instance_id, "creating record");

        sqlx::query_as::<_, User>(&SQL.insert)
            .bind(&user.instance_id)
            .bind(&user.name)
            .bind(&user.nickname)
            .bind(&user.password)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.is_admin)
            .fetch_one(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "create", e))
    }

    async fn get(&self, name: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&SQL.get)
            .bind(name)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "get", e))
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&SQL.update)
            .bind(user.id)
            .bind(&user.nickname)
            .bind(&user.password)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.is_admin)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "update", e))?
            .ok_or_else(|| StoreError::not_found(TABLE, user.id))
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(&SQL.delete)
            .bind(name)
            .execute(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage<User>, StoreError> {
        let total_count: i64 = sqlx::query_scalar(&SQL.count)
            .fetch_one(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "count", e))?;

        let items = sqlx::query_as::<_, User>(&SQL.list)
            .bind(options.offset)
            .bind(options.limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "list", e))?;

        Ok(ListPage { total_count, items })
    }
}
