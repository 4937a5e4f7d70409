use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::traits::{Column, Index, TableMetadata, TableSchema};

/// A registered user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub instance_id: String,
    pub name: String,
    pub nickname: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        nickname: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            nickname: nickname.into(),
            password: password.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}

impl TableMetadata for User {
    const SCHEMA: TableSchema = TableSchema {
        table: "users",
        columns: &[
            Column::primary_key("id", "BIGSERIAL"),
            Column::new("instance_id", "VARCHAR(32) NOT NULL DEFAULT ''"),
            Column::new("name", "VARCHAR(45) NOT NULL DEFAULT ''"),
            Column::new("nickname", "VARCHAR(30) NOT NULL DEFAULT ''"),
            Column::new("password", "VARCHAR(255) NOT NULL DEFAULT ''"),
            Column::new("email", "VARCHAR(256) NOT NULL DEFAULT ''"),
            Column::new("phone", "VARCHAR(20) NOT NULL DEFAULT ''"),
            Column::new("is_admin", "BOOLEAN NOT NULL DEFAULT FALSE"),
            Column::new("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
            Column::new("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        ],
        indexes: &[
            Index::unique("idx_users_name", "name"),
            Index::unique("idx_users_instance_id", "instance_id"),
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_never_serialized() {
        let user = User::new("colin", "Colin", "s3cret", "colin@example.com");
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["name"], "colin");

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back.password, "");
        assert_eq!(back.email, "colin@example.com");
    }

    #[test]
    fn schema_columns_match_model_fields() {
        assert_eq!(
            User::SCHEMA.select_list(),
            "id, instance_id, name, nickname, password, email, phone, is_admin, created_at, updated_at"
        );
        assert_eq!(User::SCHEMA.table, "users");
    }
}
