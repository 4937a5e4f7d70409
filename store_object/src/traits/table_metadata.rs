//! Table metadata
//!
//! Every persisted entity declares its table as a static [`TableSchema`].
//! Schema maintenance only ever generates additive DDL from it
//! (`IF NOT EXISTS` everywhere) plus `DROP TABLE IF EXISTS` for teardown.

/// A declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// Type and constraints, e.g. `VARCHAR(255) NOT NULL DEFAULT ''`.
    /// Non-key columns need a default so they can be added to populated tables.
    pub definition: &'static str,
    pub primary_key: bool,
}

impl Column {
    pub const fn new(name: &'static str, definition: &'static str) -> Self {
        Self {
            name,
            definition,
            primary_key: false,
        }
    }

    pub const fn primary_key(name: &'static str, definition: &'static str) -> Self {
        Self {
            name,
            definition,
            primary_key: true,
        }
    }
}

/// A declared index over one or more comma-separated columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub columns: &'static str,
    pub unique: bool,
}

impl Index {
    pub const fn new(name: &'static str, columns: &'static str) -> Self {
        Self {
            name,
            columns,
            unique: false,
        }
    }

    pub const fn unique(name: &'static str, columns: &'static str) -> Self {
        Self {
            name,
            columns,
            unique: true,
        }
    }
}

/// Static description of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [Column],
    pub indexes: &'static [Index],
}

impl TableSchema {
    /// Generate CREATE TABLE SQL statement
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                if column.primary_key {
                    format!("    {} {} PRIMARY KEY", column.name, column.definition)
                } else {
                    format!("    {} {}", column.name, column.definition)
                }
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.table,
            columns.join(",\n")
        )
    }

    /// One ADD COLUMN statement per non-key column, for tables created
    /// before the column was declared
    pub fn add_columns_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| !column.primary_key)
            .map(|column| {
                format!(
                    "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
                    self.table, column.name, column.definition
                )
            })
            .collect()
    }

    /// Generate CREATE INDEX SQL statements
    pub fn create_indexes_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    index.name,
                    self.table,
                    index.columns
                )
            })
            .collect()
    }

    /// Generate DROP TABLE SQL statement
    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }

    /// Comma-separated column list for SELECT and RETURNING clauses
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn primary_key(&self) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|column| column.primary_key)
            .map(|column| column.name)
    }

    /// INSERT binding `columns` as `$1..`, returning the full row
    pub fn insert_sql(&self, columns: &[&str]) -> String {
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${}", n)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            self.table,
            columns.join(", "),
            placeholders.join(", "),
            self.select_list()
        )
    }

    /// SELECT the full row where `column = $1`
    pub fn select_by_sql(&self, column: &str) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = $1",
            self.select_list(),
            self.table,
            column
        )
    }

    /// UPDATE `columns` as `$2..` where `key = $1`, returning the full row.
    /// `updated_at` is set to `NOW()` when the table declares it.
    pub fn update_sql(&self, key: &str, columns: &[&str]) -> String {
        let mut assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 2))
            .collect();
        if self.columns.iter().any(|column| column.name == "updated_at") {
            assignments.push("updated_at = NOW()".to_string());
        }

        format!(
            "UPDATE {} SET {} WHERE {} = $1 RETURNING {}",
            self.table,
            assignments.join(", "),
            key,
            self.select_list()
        )
    }

    pub fn delete_by_sql(&self, column: &str) -> String {
        format!("DELETE FROM {} WHERE {} = $1", self.table, column)
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table)
    }

    /// Newest first by primary key, windowed by `OFFSET $1 LIMIT $2`
    pub fn list_sql(&self) -> String {
        let order = self
            .primary_key()
            .map(|key| format!(" ORDER BY {} DESC", key))
            .unwrap_or_default();
        format!(
            "SELECT {} FROM {}{} OFFSET $1 LIMIT $2",
            self.select_list(),
            self.table,
            order
        )
    }
}

/// Metadata about database table structure
pub trait TableMetadata {
    const SCHEMA: TableSchema;
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGETS: TableSchema = TableSchema {
        table: "widgets",
        columns: &[
            Column::primary_key("id", "BIGSERIAL"),
            Column::new("name", "VARCHAR(64) NOT NULL DEFAULT ''"),
            Column::new("weight", "INTEGER NOT NULL DEFAULT 0"),
        ],
        indexes: &[
            Index::unique("idx_widgets_name", "name"),
            Index::new("idx_widgets_weight", "weight"),
        ],
    };

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            WIDGETS.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS widgets (\n    id BIGSERIAL PRIMARY KEY,\n    name VARCHAR(64) NOT NULL DEFAULT '',\n    weight INTEGER NOT NULL DEFAULT 0\n)"
        );
    }

    #[test]
    fn add_columns_skips_primary_key() {
        assert_eq!(
            WIDGETS.add_columns_sql(),
            vec![
                "ALTER TABLE widgets ADD COLUMN IF NOT EXISTS name VARCHAR(64) NOT NULL DEFAULT ''",
                "ALTER TABLE widgets ADD COLUMN IF NOT EXISTS weight INTEGER NOT NULL DEFAULT 0",
            ]
        );
    }

    #[test]
    fn test_create_indexes_sql() {
        assert_eq!(
            WIDGETS.create_indexes_sql(),
            vec![
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_widgets_name ON widgets (name)",
                "CREATE INDEX IF NOT EXISTS idx_widgets_weight ON widgets (weight)",
            ]
        );
    }

    #[test]
    fn test_drop_and_select() {
        assert_eq!(WIDGETS.drop_table_sql(), "DROP TABLE IF EXISTS widgets");
        assert_eq!(WIDGETS.select_list(), "id, name, weight");
        assert_eq!(WIDGETS.primary_key(), Some("id"));
    }

    #[test]
    fn test_crud_sql() {
        assert_eq!(
            WIDGETS.insert_sql(&["name", "weight"]),
            "INSERT INTO widgets (name, weight) VALUES ($1, $2) RETURNING id, name, weight"
        );
        assert_eq!(
            WIDGETS.select_by_sql("name"),
            "SELECT id, name, weight FROM widgets WHERE name = $1"
        );
        assert_eq!(
            WIDGETS.update_sql("id", &["weight"]),
            "UPDATE widgets SET weight = $2 WHERE id = $1 RETURNING id, name, weight"
        );
        assert_eq!(WIDGETS.delete_by_sql("id"), "DELETE FROM widgets WHERE id = $1");
        assert_eq!(WIDGETS.count_sql(), "SELECT COUNT(*) FROM widgets");
        assert_eq!(
            WIDGETS.list_sql(),
            "SELECT id, name, weight FROM widgets ORDER BY id DESC OFFSET $1 LIMIT $2"
        );
    }

    #[test]
    fn update_touches_updated_at_when_declared() {
        const STAMPED: TableSchema = TableSchema {
            table: "stamped",
            columns: &[
                Column::primary_key("id", "BIGSERIAL"),
                Column::new("note", "TEXT NOT NULL DEFAULT ''"),
                Column::new("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
            ],
            indexes: &[],
        };

        assert_eq!(
            STAMPED.update_sql("id", &["note"]),
            "UPDATE stamped SET note = $2, updated_at = NOW() WHERE id = $1 RETURNING id, note, updated_at"
        );
    }
}
