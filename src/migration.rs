//! Schema maintenance
//!
//! Administrative operations over every declared table. They are never run
//! implicitly: call them from the `datastore-admin` binary or explicitly at
//! startup. Tables are processed in declaration order and each operation
//! stops at the first failing table, leaving earlier tables as they are.

use sqlx::PgPool;
use store_object::{DECLARED_TABLES, TableSchema};
use tracing::info;

use crate::core::StoreFactory;
use crate::errors::{FactoryError, SchemaPhase};

/// Create missing tables, columns and indexes. Existing data and columns are
/// never dropped or altered.
pub async fn migrate(pool: &PgPool) -> Result<(), FactoryError> {
    for schema in DECLARED_TABLES {
        migrate_table(pool, schema).await?;
    }
    Ok(())
}

/// Drop every declared table
pub async fn clean(pool: &PgPool) -> Result<(), FactoryError> {
    for schema in DECLARED_TABLES {
        info!(table = schema.table, "dropping table");
        execute(pool, SchemaPhase::Clean, schema, &schema.drop_table_sql()).await?;
    }
    Ok(())
}

/// Drop and recreate every declared table. Migration only runs if every drop
/// succeeded.
pub async fn reset(pool: &PgPool) -> Result<(), FactoryError> {
    clean(pool).await?;
    migrate(pool).await
}

/// Run auto migration for one table
pub async fn migrate_table(pool: &PgPool, schema: &TableSchema) -> Result<(), FactoryError> {
    info!(table = schema.table, "migrating table");

    execute(pool, SchemaPhase::Migrate, schema, &schema.create_table_sql()).await?;

    for statement in schema.add_columns_sql() {
        execute(pool, SchemaPhase::Migrate, schema, &statement).await?;
    }

    for statement in schema.create_indexes_sql() {
        execute(pool, SchemaPhase::Migrate, schema, &statement).await?;
    }

    Ok(())
}

async fn execute(
    pool: &PgPool,
    phase: SchemaPhase,
    schema: &TableSchema,
    sql: &str,
) -> Result<(), FactoryError> {
    crate::trace_log!("{} {}: {}", phase, schema.table, sql);
    sqlx::query(sql)
        .execute(pool)
        .await
        .map_err(|source| FactoryError::Schema {
            phase,
            table: schema.table,
            source,
        })?;
    Ok(())
}

impl StoreFactory {
    /// See [`migrate`]
    pub async fn migrate(&self) -> Result<(), FactoryError> {
        migrate(self.pool()).await
    }

    /// See [`clean`]
    pub async fn clean(&self) -> Result<(), FactoryError> {
        clean(self.pool()).await
    }

    /// See [`reset`]
    pub async fn reset(&self) -> Result<(), FactoryError> {
        reset(self.pool()).await
    }
}
