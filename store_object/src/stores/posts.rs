use std::sync::LazyLock;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{new_instance_id, Post};
use crate::pagination::{ListOptions, ListPage};
use crate::stores::CrudSql;
use crate::traits::{StoreObject, TableMetadata};
use crate::StoreError;

const TABLE: &str = Post::SCHEMA.table;

static SQL: LazyLock<CrudSql> = LazyLock::new(|| {
    CrudSql::new(
        &Post::SCHEMA,
        "id",
        &["instance_id", "username", "title", "content"],
        &["title", "content"],
    )
});

static DELETE_BY_USER_SQL: LazyLock<String> =
    LazyLock::new(|| Post::SCHEMA.delete_by_sql("username"));

/// Repository handle for posts, borrowing the factory's pool
#[derive(Debug, Clone, Copy)]
pub struct PostStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PostStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The shared pool this handle queries
    pub fn pool(&self) -> &'a PgPool {
        self.pool
    }

    /// Delete every post written by `username`, returning how many were removed
    pub async fn delete_by_user(&self, username: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(&DELETE_BY_USER_SQL)
            .bind(username)
            .execute(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "delete_by_user", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl<'a> StoreObject for PostStore<'a> {
    type Model = Post;
    type Key = i64;

    async fn create(&self, mut post: Post) -> Result<Post, StoreError> {
        if post.instance_id.is_empty() {
            post.instance_id = new_instance_id("post-");
        }
        crate::debug_log!(table = TABLE, instance_id = %post.instance_id, "creating record");

        sqlx::query_as::<_, Post>(&SQL.insert)
            .bind(&post.instance_id)
            .bind(&post.username)
            .bind(&post.title)
            .bind(&post.content)
            .fetch_one(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "create", e))
    }

    async fn get(&self, id: &i64) -> Result<Option<Post>, StoreError> {
        sqlx::query_as::<_, Post>(&SQL.get)
            .bind(*id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "get", e))
    }

    async fn update(&self, post: Post) -> Result<Post, StoreError> {
        sqlx::query_as::<_, Post>(&SQL.update)
            .bind(post.id)
            .bind(&post.title)
            .bind(&post.content)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "update", e))?
            .ok_or_else(|| StoreError::not_found(TABLE, post.id))
    }

    async fn delete(&self, id: &i64) -> Result<bool, StoreError> {
        let result = sqlx::query(&SQL.delete)
            .bind(*id)
            .execute(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage<Post>, StoreError> {
        let total_count: i64 = sqlx::query_scalar(&SQL.count)
            .fetch_one(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "count", e))?;

        let items = sqlx::query_as::<_, Post>(&SQL.list)
            .bind(options.offset)
            .bind(options.limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| StoreError::query(TABLE, "list", e))?;

        Ok(ListPage { total_count, items })
    }
}
