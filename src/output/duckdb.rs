//! DuckDB table writer
//!
//! Every run writes inside one transaction. Overwrites recreate the table,
//! incremental loads upsert through the table's primary key or append when
//! it has none.

use super::{Cell, OutputColumn, OutputWriter, TableSpec, WriteStrategy, WriteSummary};
use crate::error::{Error, Result};
use crate::types::LoadType;
use duckdb::types::Value;
use duckdb::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writes tables into a DuckDB database
pub struct DuckDbWriter {
    conn: Connection,
    location: PathBuf,
    active: Option<ActiveWrite>,
}

struct ActiveWrite {
    table: String,
    strategy: WriteStrategy,
    insert_sql: String,
    key_indices: Vec<usize>,
    rows_written: u64,
}

impl DuckDbWriter {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            location: path.to_path_buf(),
            active: None,
        })
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            location: PathBuf::from(":memory:"),
            active: None,
        })
    }

    #[cfg(test)]
    pub(super) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Primary key columns of an existing table, in key order
    pub fn primary_key(&self, table: &str) -> Result<Vec<String>> {
        let sql = "SELECT kcu.column_name \
                   FROM information_schema.table_constraints tc \
                   JOIN information_schema.key_column_usage kcu \
                     ON tc.constraint_name = kcu.constraint_name \
                    AND tc.table_schema = kcu.table_schema \
                    AND tc.table_name = kcu.table_name \
                   WHERE tc.table_schema = current_schema() \
                     AND tc.table_name = ? \
                     AND tc.constraint_type = 'PRIMARY KEY' \
                   ORDER BY kcu.ordinal_position";
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Columns of an existing table with their declared types
    pub fn table_columns(&self, table: &str) -> Result<Vec<(String, String)>> {
        let sql = "SELECT column_name, data_type FROM information_schema.columns \
                   WHERE table_schema = current_schema() AND table_name = ? \
                   ORDER BY ordinal_position";
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Whether a table exists
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = ?",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn start(&mut self, table: &TableSpec, load_type: LoadType) -> Result<ActiveWrite> {
        let (strategy, key) = match load_type {
            LoadType::FullLoad => {
                let ddl = create_table_sql(
                    "CREATE OR REPLACE TABLE",
                    &table.name,
                    &declared_columns(&table.columns),
                    &table.primary_key,
                );
                debug!(sql = %ddl, "Recreating table");
                self.conn.execute_batch(&ddl)?;
                (WriteStrategy::Overwrite, table.primary_key.clone())
            }
            LoadType::IncrementalLoad if !self.table_exists(&table.name)? => {
                let ddl = create_table_sql(
                    "CREATE TABLE",
                    &table.name,
                    &declared_columns(&table.columns),
                    &table.primary_key,
                );
                debug!(sql = %ddl, "Creating table");
                self.conn.execute_batch(&ddl)?;
                let key = table.primary_key.clone();
                (WriteStrategy::incremental(key.clone()), key)
            }
            LoadType::IncrementalLoad => {
                let key = self.primary_key(&table.name)?;
                if key.is_empty() && !table.primary_key.is_empty() {
                    warn!(
                        table = %table.name,
                        "Existing table has no primary key, appending rows"
                    );
                }
                self.add_missing_columns(table, &key)?;
                (WriteStrategy::incremental(key.clone()), key)
            }
        };

        let key_indices = table.key_indices(&key)?;
        let conflict = if key.is_empty() {
            ""
        } else if key.len() == table.columns.len() {
            " OR IGNORE"
        } else {
            " OR REPLACE"
        };

        Ok(ActiveWrite {
            table: table.name.clone(),
            strategy,
            insert_sql: insert_sql(conflict, &table.name, &table.columns),
            key_indices,
            rows_written: 0,
        })
    }

    /// Rebuild the table with the columns it lacks, keeping its rows and key
    fn add_missing_columns(&self, table: &TableSpec, key: &[String]) -> Result<()> {
        let existing = self.table_columns(&table.name)?;
        let missing: Vec<&OutputColumn> = table
            .columns
            .iter()
            .filter(|c| !existing.iter().any(|(name, _)| name == &c.name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        info!(
            table = %table.name,
            columns = ?missing.iter().map(|c| &c.name).collect::<Vec<_>>(),
            "Adding new columns to existing table"
        );

        let mut declared = existing.clone();
        declared.extend(
            missing
                .iter()
                .map(|c| (c.name.clone(), c.column_type.sql_type())),
        );

        let staging = format!("{}__rebuild", table.name);
        let kept = existing
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "CREATE TABLE {staging} AS SELECT * FROM {table};\n\
             DROP TABLE {table};\n\
             {create};\n\
             INSERT INTO {table} ({kept}) SELECT {kept} FROM {staging};\n\
             DROP TABLE {staging};",
            staging = quote_ident(&staging),
            table = quote_ident(&table.name),
            create = create_table_sql("CREATE TABLE", &table.name, &declared, key),
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }
}

impl OutputWriter for DuckDbWriter {
    fn begin(&mut self, table: &TableSpec, load_type: LoadType) -> Result<WriteStrategy> {
        if self.active.is_some() {
            return Err(Error::output("a write is already in progress"));
        }

        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match self.start(table, load_type) {
            Ok(active) => {
                let strategy = active.strategy.clone();
                info!(table = %table.name, %strategy, "Writing to DuckDB");
                self.active = Some(active);
                Ok(strategy)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    fn write(&mut self, rows: &[Vec<Cell>]) -> Result<u64> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| Error::output("write called before begin"))?;

        let rows = dedupe_by_key(rows, &active.key_indices);
        let mut stmt = self.conn.prepare(&active.insert_sql)?;
        for row in &rows {
            stmt.execute(params_from_iter(row.iter().map(cell_to_value)))?;
        }

        let written = rows.len() as u64;
        active.rows_written += written;
        Ok(written)
    }

    fn commit(&mut self) -> Result<WriteSummary> {
        let active = self
            .active
            .take()
            .ok_or_else(|| Error::output("commit called before begin"))?;
        self.conn.execute_batch("COMMIT")?;

        debug!(table = %active.table, rows = active.rows_written, "Committed");
        Ok(WriteSummary {
            table: active.table,
            strategy: active.strategy,
            rows_written: active.rows_written,
            location: self.location.clone(),
        })
    }

    fn rollback(&mut self) -> Result<()> {
        if self.active.take().is_some() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl Drop for DuckDbWriter {
    fn drop(&mut self) {
        if let Err(e) = self.rollback() {
            warn!(error = %e, "Rollback on drop failed");
        }
    }
}

// ============================================================================
// SQL Helpers
// ============================================================================

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn declared_columns(columns: &[OutputColumn]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|c| (c.name.clone(), c.column_type.sql_type()))
        .collect()
}

fn create_table_sql(verb: &str, table: &str, columns: &[(String, String)], key: &[String]) -> String {
    let mut defs: Vec<String> = columns
        .iter()
        .map(|(name, ty)| format!("{} {ty}", quote_ident(name)))
        .collect();
    if !key.is_empty() {
        defs.push(format!(
            "PRIMARY KEY ({})",
            key.iter().map(|k| quote_ident(k)).collect::<Vec<_>>().join(", ")
        ));
    }
    format!("{verb} {} ({})", quote_ident(table), defs.join(", "))
}

fn insert_sql(conflict: &str, table: &str, columns: &[OutputColumn]) -> String {
    let names = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let values = columns
        .iter()
        .map(|c| format!("CAST(? AS {})", c.column_type.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT{conflict} INTO {} ({names}) VALUES ({values})", quote_ident(table))
}

fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Boolean(*b),
        Cell::Int(i) => Value::BigInt(*i),
        Cell::Float(x) => Value::Double(*x),
        other => Value::Text(other.to_string()),
    }
}

/// Keep the last row for each key
fn dedupe_by_key<'a>(rows: &'a [Vec<Cell>], key_indices: &[usize]) -> Vec<&'a Vec<Cell>> {
    if key_indices.is_empty() {
        return rows.iter().collect();
    }

    let key_of = |row: &Vec<Cell>| -> Vec<String> {
        key_indices.iter().map(|&i| row[i].to_string()).collect()
    };

    let mut last: HashMap<Vec<String>, usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        last.insert(key_of(row), i);
    }

    rows.iter()
        .enumerate()
        .filter(|(i, row)| last.get(&key_of(row)) == Some(i))
        .map(|(_, row)| row)
        .collect()
}
