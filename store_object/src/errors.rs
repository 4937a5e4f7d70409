use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error during {operation} on {table}: {source}")]
    Query {
        table: &'static str,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Not found: {table} '{key}'")]
    NotFound { table: &'static str, key: String },
}

impl StoreError {
    pub fn query(table: &'static str, operation: &'static str, source: sqlx::Error) -> Self {
        StoreError::Query {
            table,
            operation,
            source,
        }
    }

    pub fn not_found(table: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            table,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
