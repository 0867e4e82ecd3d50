//! Sync strategy selection
//!
//! A run is either FULL (every row, no filter) or INCREMENTAL (rows changed
//! since the stored watermark). The watermark is the highest value of the
//! watermark column seen by the last successful run; it is committed only
//! after the output write succeeds.

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::pagination::{compare_cursor_values, cursor_value, DeltaFilter};
use crate::sap::ResourceSchema;
use crate::types::{RawRow, SyncType};
use std::cmp::Ordering;
use std::fmt;
use tracing::{info, warn};

/// Strategy chosen for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// Extract everything from the first cursor
    Full,
    /// Extract rows changed since `since`
    Incremental {
        /// Watermark column
        column: String,
        /// Position of the watermark column in a row
        column_index: usize,
        /// Stored watermark; `None` on the first incremental run
        since: Option<String>,
    },
}

impl SyncPlan {
    /// Filter sent with every page request
    pub fn delta_filter(&self) -> Option<DeltaFilter> {
        match self {
            Self::Incremental {
                column,
                since: Some(since),
                ..
            } => Some(DeltaFilter {
                field: column.clone(),
                since: since.clone(),
            }),
            _ => None,
        }
    }

    /// Tracker for the watermark of this run, if the plan has one
    pub fn tracker(&self) -> Option<WatermarkTracker> {
        match self {
            Self::Full => None,
            Self::Incremental {
                column,
                column_index,
                since,
            } => Some(WatermarkTracker::new(
                column.clone(),
                *column_index,
                since.clone(),
            )),
        }
    }

    /// Whether the run is incremental
    pub fn is_incremental(&self) -> bool {
        matches!(self, Self::Incremental { .. })
    }
}

impl fmt::Display for SyncPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "FULL"),
            Self::Incremental {
                column,
                since: Some(since),
                ..
            } => write!(f, "INCREMENTAL on {column} since {since}"),
            Self::Incremental { column, .. } => {
                write!(f, "INCREMENTAL on {column} (no stored watermark)")
            }
        }
    }
}

/// Choose the strategy for a run.
///
/// `stored` is the watermark previously committed for the resource together
/// with the column it was taken from.
pub fn select_strategy(
    source: &SourceConfig,
    schema: &ResourceSchema,
    stored: Option<(&str, &str)>,
) -> Result<SyncPlan> {
    if source.sync_type == SyncType::FullSync {
        return Ok(SyncPlan::Full);
    }

    let column = match source
        .watermark_column()
        .or_else(|| schema.delta_pointer.clone())
    {
        Some(column) => column,
        None => {
            warn!(
                "Incremental sync requested for '{}' but no watermark column is configured \
                 and the resource has no delta pointer; running a full sync",
                schema.alias
            );
            return Ok(SyncPlan::Full);
        }
    };

    let column_index = schema.column_index(&column).ok_or_else(|| {
        Error::invalid_value(
            "source.watermark_column",
            format!("'{column}' is not a column of '{}'", schema.alias),
        )
    })?;

    let since = match stored {
        Some((stored_column, value)) if stored_column == column => Some(value.to_string()),
        Some((stored_column, _)) => {
            warn!(
                "Stored watermark was tracked on '{stored_column}', not '{column}'; ignoring it"
            );
            None
        }
        None => None,
    };

    let plan = SyncPlan::Incremental {
        column,
        column_index,
        since,
    };
    info!("Sync strategy for '{}': {plan}", schema.alias);
    Ok(plan)
}

/// Tracks the highest watermark column value of a run
#[derive(Debug, Clone)]
pub struct WatermarkTracker {
    column: String,
    column_index: usize,
    current: Option<String>,
}

impl WatermarkTracker {
    /// Start from the stored watermark so the value never moves backwards
    pub fn new(column: String, column_index: usize, start: Option<String>) -> Self {
        Self {
            column,
            column_index,
            current: start,
        }
    }

    /// Fold the rows of a page into the watermark
    pub fn observe(&mut self, rows: &[RawRow]) {
        for value in rows
            .iter()
            .filter_map(|row| row.get(self.column_index).and_then(cursor_value))
        {
            let greater = self
                .current
                .as_deref()
                .map_or(true, |current| {
                    compare_cursor_values(&value, current) == Ordering::Greater
                });
            if greater {
                self.current = Some(value);
            }
        }
    }

    /// Watermark column
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Current watermark
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// `(column, value)` to commit, if any value was seen or stored
    pub fn into_commit(self) -> Option<(String, String)> {
        self.current.map(|value| (self.column, value))
    }
}
