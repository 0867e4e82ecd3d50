//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::error::Result;
use crate::types::{JsonValue, RawRow};
use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Position of a page within a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Row offset of the first row on the page
    Offset(u64),
    /// Last key seen on the previous page (`None` for the first page)
    Key(Option<String>),
    /// The whole resource in one request
    Unpaged,
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "offset {offset}"),
            Self::Key(Some(key)) => write!(f, "after key {key}"),
            Self::Key(None) => write!(f, "first key page"),
            Self::Unpaged => write!(f, "unpaged"),
        }
    }
}

/// Changed-since filter applied to incremental runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaFilter {
    /// Column compared against the watermark
    pub field: String,
    /// Stored watermark value
    pub since: String,
}

/// A single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Page position
    pub cursor: PageCursor,
    /// Maximum rows per page
    pub page_size: u32,
    /// Ordering column for key paging
    pub key_field: Option<String>,
    /// Incremental filter
    pub delta: Option<DeltaFilter>,
}

impl PageRequest {
    /// Create a request for the given cursor
    pub fn new(cursor: PageCursor, page_size: u32) -> Self {
        Self {
            cursor,
            page_size,
            key_field: None,
            delta: None,
        }
    }

    /// Set the key paging column
    #[must_use]
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = Some(field.into());
        self
    }

    /// Set the incremental filter
    #[must_use]
    pub fn with_delta(mut self, delta: Option<DeltaFilter>) -> Self {
        self.delta = delta;
        self
    }

    /// Same request at another cursor
    #[must_use]
    pub fn at(&self, cursor: PageCursor) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }

    /// Query parameters understood by the SAP data source endpoint
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        match &self.cursor {
            PageCursor::Offset(offset) => {
                let limit = u64::from(self.page_size.max(1));
                params.push(("limit".to_string(), self.page_size.to_string()));
                params.push(("offset".to_string(), offset.to_string()));
                params.push(("page".to_string(), (offset / limit).to_string()));
            }
            PageCursor::Key(after) => {
                params.push(("limit".to_string(), self.page_size.to_string()));
                if let Some(field) = &self.key_field {
                    params.push(("key_field".to_string(), field.clone()));
                }
                if let Some(after) = after {
                    params.push(("after".to_string(), after.clone()));
                }
            }
            PageCursor::Unpaged => {}
        }
        if let Some(delta) = &self.delta {
            params.push(("delta_field".to_string(), delta.field.clone()));
            params.push(("changed_since".to_string(), delta.since.clone()));
        }
        params
    }
}

/// A fetched page: the request that produced it and its positional rows
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Request that produced the page
    pub request: PageRequest,
    /// Rows aligned with the resource's columns
    pub rows: Vec<RawRow>,
}

impl Page {
    /// Number of rows on the page
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the page has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available at this cursor
    Continue(PageCursor),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Cursor of the first page
    fn first_cursor(&self) -> PageCursor;

    /// Decide what follows `request` given the rows it returned
    fn next_page(&self, request: &PageRequest, rows: &[RawRow]) -> Result<NextPage>;
}

/// Hands out non-overlapping offsets to concurrent page requests
#[derive(Debug)]
pub struct CursorAllocator {
    next: AtomicU64,
    step: u64,
}

impl CursorAllocator {
    /// Start at `start`, advancing by `step` rows per allocation
    pub fn new(start: u64, step: u32) -> Self {
        Self {
            next: AtomicU64::new(start),
            step: u64::from(step.max(1)),
        }
    }

    /// Claim the next offset
    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(self.step, AtomicOrdering::Relaxed)
    }
}

/// Render a cell as a cursor/watermark string. Null and nested values have none.
pub fn cursor_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Compare two cursor values: numerically when both parse as numbers,
/// otherwise lexically
pub fn compare_cursor_values(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => a.cmp(b),
    }
}
