//! Engine types
//!
//! Statistics and the report returned by a finished run.

use serde::Serialize;
use std::path::PathBuf;

/// Counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Pages fetched
    pub pages_fetched: u64,
    /// Rows received from the endpoint
    pub rows_fetched: u64,
    /// Rows handed to the writer after de-duplication
    pub rows_written: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a fetched page
    pub fn add_page(&mut self, rows_fetched: usize, rows_written: u64) {
        self.pages_fetched += 1;
        self.rows_fetched += rows_fetched as u64;
        self.rows_written += rows_written;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Resource alias
    pub resource: String,
    /// Output table name
    pub table: String,
    /// Sync strategy, e.g. `INCREMENTAL on LAEDA since 20240101`
    pub sync: String,
    /// Write strategy, e.g. `upsert on (MATNR)`
    pub write: String,
    /// Watermark committed by this run
    pub watermark: Option<String>,
    /// Where the table was written
    pub location: PathBuf,
    /// Counters
    pub stats: RunStats,
}
