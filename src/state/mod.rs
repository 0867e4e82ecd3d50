//! State management module
//!
//! Persists the per-resource watermark between runs so incremental syncs can
//! resume where the last successful run stopped.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Per-resource watermark and run bookkeeping
//! - `StateManager` - File-based state persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{ResourceState, State};

#[cfg(test)]
mod manager_tests;
