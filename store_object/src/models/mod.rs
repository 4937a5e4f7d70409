//! Persisted entities

pub mod post;
pub mod user;

pub use post::Post;
pub use user::User;

use crate::traits::{TableMetadata, TableSchema};

/// Every table owned by the datastore, in declaration order.
/// Schema maintenance walks this list front to back.
pub const DECLARED_TABLES: &[TableSchema] = &[User::SCHEMA, Post::SCHEMA];

/// External-facing identifier such as `user-0c3HkQm7a_Xp2b`
pub fn new_instance_id(prefix: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + short_id::SHORT_ID_LEN);
    id.push_str(prefix);
    id.push_str(&short_id::generate_short_id());
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_declared_in_order() {
        let names: Vec<_> = DECLARED_TABLES.iter().map(|schema| schema.table).collect();
        assert_eq!(names, vec!["users", "posts"]);
    }

    #[test]
    fn every_table_has_a_primary_key() {
        for schema in DECLARED_TABLES {
            assert_eq!(schema.primary_key(), Some("id"), "{}", schema.table);
        }
    }

    #[test]
    fn instance_ids_are_uniquely_indexed() {
        for schema in DECLARED_TABLES {
            let index = schema
                .indexes
                .iter()
                .find(|index| index.columns == "instance_id")
                .unwrap_or_else(|| panic!("{} has no instance_id index", schema.table));
            assert!(index.unique, "{}", index.name);
            assert!(schema
                .create_indexes_sql()
                .contains(&format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} (instance_id)",
                    index.name, schema.table
                )));
        }
    }

    #[test]
    fn instance_ids_carry_prefix() {
        let id = new_instance_id("user-");
        assert!(id.starts_with("user-"));
        assert_eq!(id.len(), "user-".len() + short_id::SHORT_ID_LEN);
        assert_ne!(id, new_instance_id("user-"));
    }
}
