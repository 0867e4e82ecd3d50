//! Pagination strategy implementations
//!
//! Each strategy handles one way of addressing SAP data source pages.

use super::types::{compare_cursor_values, cursor_value, NextPage, PageCursor, PageRequest, Paginator};
use crate::error::{Error, Result};
use crate::types::RawRow;
use std::cmp::Ordering;

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination
///
/// The next page starts where the previous one ended; a page shorter than the
/// limit is the last one.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Number of records per page
    pub limit: u32,
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }
}

impl Paginator for OffsetPaginator {
    fn first_cursor(&self) -> PageCursor {
        PageCursor::Offset(0)
    }

    fn next_page(&self, request: &PageRequest, rows: &[RawRow]) -> Result<NextPage> {
        let PageCursor::Offset(offset) = request.cursor else {
            return Ok(NextPage::Done);
        };

        if rows.len() > self.limit as usize {
            return Err(Error::decode(
                format!("page {}", request.cursor),
                format!(
                    "returned {} rows, more than the limit of {}",
                    rows.len(),
                    self.limit
                ),
            ));
        }

        if rows.len() < self.limit as usize {
            return Ok(NextPage::Done);
        }

        Ok(NextPage::Continue(PageCursor::Offset(
            offset + rows.len() as u64,
        )))
    }
}

// ============================================================================
// Key Pagination
// ============================================================================

/// Key-based pagination
///
/// The cursor is the ordering key of the last row seen; the next page asks for
/// keys after it. An empty page ends the extraction.
#[derive(Debug, Clone)]
pub struct KeyPaginator {
    /// Ordering column
    pub key_field: String,
    /// Position of the ordering column within a row
    pub key_index: usize,
}

impl KeyPaginator {
    /// Create a new key paginator
    pub fn new(key_field: impl Into<String>, key_index: usize) -> Self {
        Self {
            key_field: key_field.into(),
            key_index,
        }
    }
}

impl Paginator for KeyPaginator {
    fn first_cursor(&self) -> PageCursor {
        PageCursor::Key(None)
    }

    fn next_page(&self, request: &PageRequest, rows: &[RawRow]) -> Result<NextPage> {
        let Some(last) = rows.last() else {
            return Ok(NextPage::Done);
        };

        let last_key = last
            .get(self.key_index)
            .and_then(cursor_value)
            .ok_or_else(|| {
                Error::decode(
                    format!("page {}", request.cursor),
                    format!("paging key '{}' is empty on the last row", self.key_field),
                )
            })?;

        if let PageCursor::Key(Some(previous)) = &request.cursor {
            if compare_cursor_values(&last_key, previous) != Ordering::Greater {
                return Err(Error::decode(
                    format!("page {}", request.cursor),
                    format!(
                        "paging key '{}' did not advance past '{previous}' (last key '{last_key}')",
                        self.key_field
                    ),
                ));
            }
        }

        Ok(NextPage::Continue(PageCursor::Key(Some(last_key))))
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// Single request for resources that do not support paging
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn first_cursor(&self) -> PageCursor {
        PageCursor::Unpaged
    }

    fn next_page(&self, _request: &PageRequest, _rows: &[RawRow]) -> Result<NextPage> {
        Ok(NextPage::Done)
    }
}
