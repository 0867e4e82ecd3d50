//! Output module
//!
//! Writes converted rows into the destination table.
//!
//! # Overview
//!
//! A run hands its rows to an [`OutputWriter`] in three phases:
//! - `begin` resolves the write strategy for the table and load type
//! - `write` is called once per fetched page
//! - `commit` makes the rows visible, `rollback` discards them
//!
//! Nothing written during a run is visible until `commit` succeeds.

mod duckdb;
mod parquet;
mod schema;

pub use self::duckdb::DuckDbWriter;
pub use self::parquet::{
    read_table, ParquetTableWriter, ParquetWriter, ParquetWriterConfig, StoredTable,
    PRIMARY_KEY_METADATA,
};
pub use schema::{
    batch_to_cells, cells_to_batch, format_decimal, parse_date, parse_decimal, parse_time,
    parse_timestamp, Cell, ColumnType, OutputColumn, TableSpec, DECIMAL_PRECISION,
};

use crate::error::Result;
use crate::types::{LoadType, OutputFormat};
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the DuckDB database inside the output directory
pub const DUCKDB_FILE_NAME: &str = "output.duckdb";

/// How rows reach the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Replace the table contents
    Overwrite,
    /// Insert or replace rows by key
    Upsert {
        /// Key columns
        key: Vec<String>,
    },
    /// Add rows to the existing contents
    Append,
}

impl WriteStrategy {
    /// Pick the incremental strategy for a key
    pub fn incremental(key: Vec<String>) -> Self {
        if key.is_empty() {
            Self::Append
        } else {
            Self::Upsert { key }
        }
    }
}

impl fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Upsert { key } => write!(f, "upsert on ({})", key.join(", ")),
            Self::Append => write!(f, "append"),
        }
    }
}

/// Result of a committed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Table name
    pub table: String,
    /// Strategy used
    pub strategy: WriteStrategy,
    /// Rows handed to the writer
    pub rows_written: u64,
    /// Where the table lives
    pub location: PathBuf,
}

/// Destination of one run's rows
pub trait OutputWriter: Send {
    /// Start a write to `table`
    fn begin(&mut self, table: &TableSpec, load_type: LoadType) -> Result<WriteStrategy>;

    /// Write rows in table column order
    fn write(&mut self, rows: &[Vec<Cell>]) -> Result<u64>;

    /// Make the written rows visible
    fn commit(&mut self) -> Result<WriteSummary>;

    /// Discard everything written since `begin`
    fn rollback(&mut self) -> Result<()>;
}

/// Open the writer for `format` inside `output_dir`
pub fn open_writer(format: OutputFormat, output_dir: &Path) -> Result<Box<dyn OutputWriter>> {
    std::fs::create_dir_all(output_dir)?;
    Ok(match format {
        OutputFormat::Duckdb => Box::new(DuckDbWriter::open(output_dir.join(DUCKDB_FILE_NAME))?),
        OutputFormat::Parquet => Box::new(ParquetTableWriter::new(
            output_dir,
            ParquetWriterConfig::default(),
        )),
    })
}
