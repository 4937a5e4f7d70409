use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::traits::{Column, Index, TableMetadata, TableSchema};

/// A post written by a user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub instance_id: String,
    /// Author's user name
    pub username: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        username: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

impl TableMetadata for Post {
    const SCHEMA: TableSchema = TableSchema {
        table: "posts",
        columns: &[
            Column::primary_key("id", "BIGSERIAL"),
            Column::new("instance_id", "VARCHAR(32) NOT NULL DEFAULT ''"),
            Column::new("username", "VARCHAR(45) NOT NULL DEFAULT ''"),
            Column::new("title", "VARCHAR(255) NOT NULL DEFAULT ''"),
            Column::new("content", "TEXT NOT NULL DEFAULT ''"),
            Column::new("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
            Column::new("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        ],
        indexes: &[
            Index::new("idx_posts_username", "username"),
            Index::unique("idx_posts_instance_id", "instance_id"),
        ],
    };
}
