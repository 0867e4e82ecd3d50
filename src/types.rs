//! Common types used throughout the extractor
//!
//! This module contains shared type definitions, type aliases,
//! and the enums that appear in the configuration file.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A positional row as returned by the SAP endpoint
pub type RawRow = Vec<JsonValue>;

// ============================================================================
// Sync Type
// ============================================================================

/// Which rows a run extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// Re-extract everything every run
    #[default]
    FullSync,
    /// Only rows changed since the stored watermark
    IncrementalSync,
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncType::FullSync => write!(f, "full_sync"),
            SyncType::IncrementalSync => write!(f, "incremental_sync"),
        }
    }
}

// ============================================================================
// Paging Method
// ============================================================================

/// How pages are addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingMethod {
    /// Row offset cursor
    #[default]
    Offset,
    /// Last-seen ordering key cursor
    Key,
}

impl fmt::Display for PagingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingMethod::Offset => write!(f, "offset"),
            PagingMethod::Key => write!(f, "key"),
        }
    }
}

// ============================================================================
// Load Type
// ============================================================================

/// How rows are written to the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadType {
    /// Overwrite the table with this run's rows
    #[default]
    FullLoad,
    /// Upsert by primary key, or append when there is none
    IncrementalLoad,
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadType::FullLoad => write!(f, "full_load"),
            LoadType::IncrementalLoad => write!(f, "incremental_load"),
        }
    }
}

// ============================================================================
// Output Format
// ============================================================================

/// Storage used for the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// A table inside a DuckDB database file
    #[default]
    Duckdb,
    /// One Parquet file per table
    Parquet,
}

// ============================================================================
// Auth Type
// ============================================================================

/// How credentials are presented to the SAP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// HTTP Basic with username/password on every request
    #[default]
    Basic,
    /// Username/password exchanged for a bearer token
    Token,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_type_serde() {
        let mode: SyncType = serde_json::from_str("\"incremental_sync\"").unwrap();
        assert_eq!(mode, SyncType::IncrementalSync);

        let json = serde_json::to_string(&SyncType::FullSync).unwrap();
        assert_eq!(json, "\"full_sync\"");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SyncType::default(), SyncType::FullSync);
        assert_eq!(PagingMethod::default(), PagingMethod::Offset);
        assert_eq!(LoadType::default(), LoadType::FullLoad);
        assert_eq!(OutputFormat::default(), OutputFormat::Duckdb);
        assert_eq!(AuthType::default(), AuthType::Basic);
    }

    #[test]
    fn test_display_matches_serde() {
        for load in [LoadType::FullLoad, LoadType::IncrementalLoad] {
            let json = serde_json::to_string(&load).unwrap();
            assert_eq!(json, format!("\"{load}\""));
        }
        for paging in [PagingMethod::Offset, PagingMethod::Key] {
            let json = serde_json::to_string(&paging).unwrap();
            assert_eq!(json, format!("\"{paging}\""));
        }
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some("  ".to_string()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!("".to_string().none_if_empty(), None);
    }
}
