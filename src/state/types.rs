//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete state of the extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-resource state, keyed by resource alias
    #[serde(default)]
    pub resources: HashMap<String, ResourceState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a resource
    pub fn get_resource(&self, alias: &str) -> Option<&ResourceState> {
        self.resources.get(alias)
    }

    /// Get mutable state for a resource, creating if needed
    pub fn get_resource_mut(&mut self, alias: &str) -> &mut ResourceState {
        self.resources.entry(alias.to_string()).or_default()
    }

    /// Stored watermark for a resource, if it was tracked on `column`
    pub fn watermark_for(&self, alias: &str, column: &str) -> Option<&str> {
        let resource = self.resources.get(alias)?;
        if resource.watermark_column.as_deref() != Some(column) {
            return None;
        }
        resource.watermark.as_deref()
    }
}

/// State for a single resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Highest watermark column value extracted by a successful run
    #[serde(default)]
    pub watermark: Option<String>,

    /// Column the watermark was taken from
    #[serde(default)]
    pub watermark_column: Option<String>,

    /// When the last successful run finished
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,

    /// Rows extracted by the last successful run
    #[serde(default)]
    pub rows_last_run: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.resources.is_empty());
        assert!(state.get_resource("ZMAT").is_none());
    }

    #[test]
    fn test_watermark_for_matching_column_only() {
        let mut state = State::new();
        let resource = state.get_resource_mut("ZMAT");
        resource.watermark = Some("20240101".to_string());
        resource.watermark_column = Some("LAEDA".to_string());

        assert_eq!(state.watermark_for("ZMAT", "LAEDA"), Some("20240101"));
        assert_eq!(state.watermark_for("ZMAT", "ERSDA"), None);
        assert_eq!(state.watermark_for("ZCUST", "LAEDA"), None);
    }

    #[test]
    fn test_state_deserializes_partial_documents() {
        let state: State = serde_json::from_str(r#"{"resources": {"ZMAT": {"watermark": "5"}}}"#).unwrap();
        let resource = state.get_resource("ZMAT").unwrap();
        assert_eq!(resource.watermark.as_deref(), Some("5"));
        assert_eq!(resource.rows_last_run, 0);

        let empty: State = serde_json::from_str("{}").unwrap();
        assert!(empty.resources.is_empty());
    }
}
