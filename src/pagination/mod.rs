//! Pagination module
//!
//! Supports: Offset, Key, and unpaged resources
//!
//! # Overview
//!
//! A `Paginator` decides the cursor of the first page and, given the rows a
//! page returned, whether another page follows. Offset paging can be driven
//! concurrently through a `CursorAllocator`; key paging is inherently
//! sequential.

mod strategies;
mod types;

pub use strategies::{KeyPaginator, NoPaginator, OffsetPaginator};
pub use types::{
    compare_cursor_values, cursor_value, CursorAllocator, DeltaFilter, NextPage, Page,
    PageCursor, PageRequest, Paginator,
};
