//! Repository handles
//!
//! Handles hold a borrowed `&PgPool`, so they can never outlive the pool's
//! owner. Constructing one is free; queries go straight to the shared pool.

pub mod posts;
pub mod users;

pub use posts::PostStore;
pub use users::UserStore;

use crate::traits::TableSchema;

/// Statements for one repository, generated from its table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CrudSql {
    pub insert: String,
    pub get: String,
    pub update: String,
    pub delete: String,
    pub count: String,
    pub list: String,
}

impl CrudSql {
    /// `lookup` keys `get` and `delete`; `update` is keyed by the primary key
    pub fn new(
        schema: &TableSchema,
        lookup: &str,
        insertable: &[&str],
        updatable: &[&str],
    ) -> Self {
        let key = schema.primary_key().unwrap_or("id");
        Self {
            insert: schema.insert_sql(insertable),
            get: schema.select_by_sql(lookup),
            update: schema.update_sql(key, updatable),
            delete: schema.delete_by_sql(lookup),
            count: schema.count_sql(),
            list: schema.list_sql(),
        }
    }
}
