//! Parquet table writer
//!
//! One file per table. Files are written next to the target and renamed into
//! place on commit, so readers never see a partial table. The primary key is
//! kept in the file's key-value metadata for later incremental loads.

use super::{
    batch_to_cells, cells_to_batch, Cell, ColumnType, OutputColumn, OutputWriter, TableSpec,
    WriteStrategy, WriteSummary,
};
use crate::error::{Error, Result, ResultExt};
use crate::types::LoadType;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key-value metadata entry holding the table's primary key as a JSON array
pub const PRIMARY_KEY_METADATA: &str = "sap_erp_extractor.primary_key";

/// Rows per record batch when rewriting a merged table
const MERGE_BATCH_ROWS: usize = 65_536;

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
    dictionary_enabled: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
            dictionary_enabled: true,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression algorithm
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Get row group size
    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Build writer properties carrying the primary key
    fn build_properties(&self, primary_key: &[String]) -> Result<WriterProperties> {
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .set_key_value_metadata(Some(vec![KeyValue::new(
                PRIMARY_KEY_METADATA.to_string(),
                serde_json::to_string(primary_key)?,
            )]));

        if !self.dictionary_enabled {
            builder = builder.set_dictionary_enabled(false);
        }

        Ok(builder.build())
    }
}

// ============================================================================
// File Writer
// ============================================================================

/// Parquet file writer
pub struct ParquetWriter {
    /// Arrow writer
    writer: ArrowWriter<File>,
    /// Number of rows written
    rows_written: usize,
}

impl ParquetWriter {
    /// Create a new Parquet writer
    pub fn new(
        path: impl AsRef<Path>,
        schema: &Schema,
        primary_key: &[String],
        config: &ParquetWriterConfig,
    ) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(|e| Error::Output {
            message: format!("Failed to create file: {e}"),
        })?;

        let props = config.build_properties(primary_key)?;
        let writer =
            ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props)).map_err(|e| {
                Error::Output {
                    message: format!("Failed to create Parquet writer: {e}"),
                }
            })?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch to the file
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch: {e}"),
        })?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Close the writer and finalize the file
    pub fn close(self) -> Result<usize> {
        let rows = self.rows_written;
        self.writer.close().map_err(|e| Error::Output {
            message: format!("Failed to close Parquet writer: {e}"),
        })?;
        Ok(rows)
    }
}

/// Contents of a previously written table file
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    /// Columns in file order
    pub columns: Vec<OutputColumn>,
    /// Primary key from the file metadata; empty when none was recorded
    pub primary_key: Vec<String>,
    /// Rows in file order
    pub rows: Vec<Vec<Cell>>,
}

/// Read a table file written by [`ParquetTableWriter`]
pub fn read_table(path: impl AsRef<Path>) -> Result<StoredTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::Output {
        message: format!("Failed to open {}: {e}", path.display()),
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let primary_key = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .and_then(|kv| kv.iter().find(|e| e.key == PRIMARY_KEY_METADATA))
        .and_then(|e| e.value.as_deref())
        .map(serde_json::from_str::<Vec<String>>)
        .transpose()?
        .unwrap_or_default();

    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|field| {
            ColumnType::from_arrow(field.data_type())
                .map(|ty| OutputColumn::new(field.name(), ty))
                .ok_or_else(|| {
                    Error::output(format!(
                        "column '{}' of {} has unsupported type {}",
                        field.name(),
                        path.display(),
                        field.data_type()
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for batch in builder.build()? {
        rows.extend(batch_to_cells(&batch?, &columns)?);
    }

    Ok(StoredTable {
        columns,
        primary_key,
        rows,
    })
}

// ============================================================================
// Table Writer
// ============================================================================

/// Writes each table to `<dir>/<table>.parquet`
pub struct ParquetTableWriter {
    dir: PathBuf,
    config: ParquetWriterConfig,
    active: Option<ActiveTable>,
}

struct ActiveTable {
    table: String,
    path: PathBuf,
    temp_path: PathBuf,
    strategy: WriteStrategy,
    rows_written: u64,
    pending: Pending,
}

enum Pending {
    /// Overwrite without a key: rows go straight to the temp file
    Streaming {
        columns: Vec<OutputColumn>,
        writer: ParquetWriter,
    },
    /// Keyed overwrite or incremental: rows merged by key in memory, written
    /// on commit. Overwrites start from no rows.
    Merging {
        columns: Vec<OutputColumn>,
        primary_key: Vec<String>,
        /// Width of incoming rows; wider tables keep older columns as null
        incoming_width: usize,
        key_indices: Vec<usize>,
        rows: Vec<Vec<Cell>>,
        index: HashMap<Vec<String>, usize>,
    },
}

impl ParquetTableWriter {
    /// Create a writer for tables in `dir`
    pub fn new(dir: impl Into<PathBuf>, config: ParquetWriterConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
            active: None,
        }
    }

    /// Path of a table's file
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.parquet"))
    }

    fn start(&self, table: &TableSpec, load_type: LoadType) -> Result<ActiveTable> {
        fs::create_dir_all(&self.dir)?;
        let path = self.table_path(&table.name);
        let temp_path = path.with_extension("parquet.tmp");

        let (strategy, pending) = match load_type {
            LoadType::FullLoad if !table.primary_key.is_empty() => {
                let key_indices = key_positions(&table.columns, &table.primary_key)?;
                (
                    WriteStrategy::Overwrite,
                    Pending::Merging {
                        columns: table.columns.clone(),
                        primary_key: table.primary_key.clone(),
                        incoming_width: table.columns.len(),
                        key_indices,
                        rows: Vec::new(),
                        index: HashMap::new(),
                    },
                )
            }
            LoadType::FullLoad => {
                let writer = ParquetWriter::new(
                    &temp_path,
                    &table.arrow_schema(),
                    &table.primary_key,
                    &self.config,
                )?;
                (
                    WriteStrategy::Overwrite,
                    Pending::Streaming {
                        columns: table.columns.clone(),
                        writer,
                    },
                )
            }
            LoadType::IncrementalLoad => {
                let (columns, primary_key, existing) = if path.exists() {
                    let stored = read_table(&path)?;
                    if stored.primary_key.is_empty() && !table.primary_key.is_empty() {
                        warn!(
                            table = %table.name,
                            "Existing file has no primary key, appending rows"
                        );
                    }
                    let columns = merge_columns(table, &stored.columns)?;
                    let rows = widen_rows(stored.rows, &stored.columns, &columns);
                    (columns, stored.primary_key, rows)
                } else {
                    (table.columns.clone(), table.primary_key.clone(), Vec::new())
                };

                let key_indices = key_positions(&columns, &primary_key)?;
                let mut index = HashMap::new();
                if !key_indices.is_empty() {
                    for (i, row) in existing.iter().enumerate() {
                        index.insert(key_of(row, &key_indices), i);
                    }
                }

                (
                    WriteStrategy::incremental(primary_key.clone()),
                    Pending::Merging {
                        columns,
                        primary_key,
                        incoming_width: table.columns.len(),
                        key_indices,
                        rows: existing,
                        index,
                    },
                )
            }
        };

        Ok(ActiveTable {
            table: table.name.clone(),
            path,
            temp_path,
            strategy,
            rows_written: 0,
            pending,
        })
    }
}

impl OutputWriter for ParquetTableWriter {
    fn begin(&mut self, table: &TableSpec, load_type: LoadType) -> Result<WriteStrategy> {
        if self.active.is_some() {
            return Err(Error::output("a write is already in progress"));
        }

        let active = self.start(table, load_type)?;
        let strategy = active.strategy.clone();
        info!(table = %table.name, path = %active.path.display(), %strategy, "Writing Parquet");
        self.active = Some(active);
        Ok(strategy)
    }

    fn write(&mut self, rows: &[Vec<Cell>]) -> Result<u64> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| Error::output("write called before begin"))?;

        match &mut active.pending {
            Pending::Streaming { columns, writer } => {
                if !rows.is_empty() {
                    writer.write(&cells_to_batch(columns, rows)?)?;
                }
            }
            Pending::Merging {
                columns,
                incoming_width,
                key_indices,
                rows: merged,
                index,
                ..
            } => {
                for row in rows {
                    let mut row = row.clone();
                    row.truncate(*incoming_width);
                    row.resize(columns.len(), Cell::Null);

                    if key_indices.is_empty() {
                        merged.push(row);
                        continue;
                    }
                    let key = key_of(&row, key_indices);
                    match index.get(&key) {
                        Some(&pos) => merged[pos] = row,
                        None => {
                            index.insert(key, merged.len());
                            merged.push(row);
                        }
                    }
                }
            }
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

        let result = match active.pending {
            Pending::Streaming { writer, .. } => writer.close().map(|_| ()),
            Pending::Merging {
                columns,
                primary_key,
                rows,
                ..
            } => write_rows(&active.temp_path, &columns, &primary_key, &rows, &self.config),
        };
        if let Err(e) = result {
            remove_temp(&active.temp_path);
            return Err(e);
        }

        fs::rename(&active.temp_path, &active.path)
            .with_context(|| format!("Failed to move {} into place", active.path.display()))?;
        debug!(path = %active.path.display(), rows = active.rows_written, "Committed");

        Ok(WriteSummary {
            table: active.table,
            strategy: active.strategy,
            rows_written: active.rows_written,
            location: active.path,
        })
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(active) = self.active.take() {
            drop(active.pending);
            remove_temp(&active.temp_path);
        }
        Ok(())
    }
}

impl Drop for ParquetTableWriter {
    fn drop(&mut self) {
        let _ = self.rollback();
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// New table columns followed by stored columns the source no longer has
fn merge_columns(table: &TableSpec, stored: &[OutputColumn]) -> Result<Vec<OutputColumn>> {
    let mut columns = table.columns.clone();
    for old in stored {
        match columns.iter().find(|c| c.name == old.name) {
            Some(new) if new.column_type != old.column_type => {
                return Err(Error::output(format!(
                    "column '{}' changed type from {:?} to {:?}; run a full load",
                    old.name, old.column_type, new.column_type
                )));
            }
            Some(_) => {}
            None => columns.push(old.clone()),
        }
    }
    Ok(columns)
}

/// Re-order stored rows into the merged column layout
fn widen_rows(
    rows: Vec<Vec<Cell>>,
    from: &[OutputColumn],
    to: &[OutputColumn],
) -> Vec<Vec<Cell>> {
    let mapping: Vec<Option<usize>> = to
        .iter()
        .map(|c| from.iter().position(|f| f.name == c.name))
        .collect();
    rows.into_iter()
        .map(|row| {
            mapping
                .iter()
                .map(|pos| pos.map_or(Cell::Null, |i| row[i].clone()))
                .collect()
        })
        .collect()
}

fn key_positions(columns: &[OutputColumn], key: &[String]) -> Result<Vec<usize>> {
    key.iter()
        .map(|k| {
            columns
                .iter()
                .position(|c| &c.name == k)
                .ok_or_else(|| Error::output(format!("key column '{k}' is missing from the table")))
        })
        .collect()
}

fn key_of(row: &[Cell], key_indices: &[usize]) -> Vec<String> {
    key_indices.iter().map(|&i| row[i].to_string()).collect()
}

fn write_rows(
    path: &Path,
    columns: &[OutputColumn],
    primary_key: &[String],
    rows: &[Vec<Cell>],
    config: &ParquetWriterConfig,
) -> Result<()> {
    let schema = Schema::new(
        columns
            .iter()
            .map(|c| arrow::datatypes::Field::new(&c.name, c.column_type.arrow_type(), true))
            .collect::<Vec<_>>(),
    );
    let mut writer = ParquetWriter::new(path, &schema, primary_key, config)?;
    for chunk in rows.chunks(MERGE_BATCH_ROWS) {
        writer.write(&cells_to_batch(columns, chunk)?)?;
    }
    writer.close()?;
    Ok(())
}

fn remove_temp(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
        }
    }
}
