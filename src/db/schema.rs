use crate::error::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One column of the schema snapshot, as reported by the store's own
/// introspection pragma.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub decl_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

impl ColumnInfo {
    /// Coarse type class used when mapping store columns onto columnar
    /// output types.
    pub fn is_integer(&self) -> bool {
        self.decl_type.to_uppercase().contains("INT")
    }

    pub fn is_real(&self) -> bool {
        let upper = self.decl_type.to_uppercase();
        upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB")
    }
}

/// Create all tables and indexes. Idempotent.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("create_schema.sql"))?;
    Ok(())
}

/// Names of the user tables, in sqlite_master order.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Column descriptions for one table via `PRAGMA table_info`.
pub fn table_info(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                decl_type: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: row.get(4)?,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Machine-readable description of every table: a snapshot, not an
/// interface.
pub fn schema_snapshot(conn: &Connection) -> Result<BTreeMap<String, Vec<ColumnInfo>>> {
    let mut snapshot = BTreeMap::new();
    for table in table_names(conn)? {
        let columns = table_info(conn, &table)?;
        snapshot.insert(table, columns);
    }
    Ok(snapshot)
}
