// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # SAP ERP Extractor
//!
//! Extracts rows from an SAP data source API into a DuckDB table or a
//! Parquet file.
//!
//! ## Features
//!
//! - **Resource listing**: enumerate extractable data sources for a configuration UI
//! - **Paged fetching**: offset paging with concurrent requests, or key paging
//! - **Incremental sync**: a watermark persisted between runs
//! - **Output**: overwrite, upsert by primary key, or append
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sap_erp_extractor::config::ConfigFile;
//! use sap_erp_extractor::engine::ExtractionEngine;
//! use sap_erp_extractor::sap::SapClient;
//! use sap_erp_extractor::state::StateManager;
//!
//! #[tokio::main]
//! async fn main() -> sap_erp_extractor::Result<()> {
//!     let config = ConfigFile::load("config.json")?.parameters;
//!     let client = SapClient::new(&config.authentication, &config.http)?;
//!     let engine = ExtractionEngine::new(client, StateManager::from_file("state.json")?, "out");
//!
//!     let report = engine.run(&config).await?;
//!     println!("{} rows written to {}", report.stats.rows_written, report.table);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ExtractionEngine                          │
//! │  find_resource → select_strategy → fetch_pages → OutputWriter    │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌───────────┬────────────┬──────┴───────┬────────────┬────────────┐
//! │   Auth    │    HTTP    │   Paginate   │    Sync    │   Output   │
//! ├───────────┼────────────┼──────────────┼────────────┼────────────┤
//! │ Basic     │ Retry      │ Offset       │ Full       │ DuckDB     │
//! │ Token     │ Rate Limit │ Key          │ Incremental│ Parquet    │
//! │           │ Backoff    │ Unpaged      │ Watermark  │            │
//! └───────────┴────────────┴──────────────┴────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Configuration file and validation
pub mod config;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// SAP data source API
pub mod sap;

/// Paginated fetching
pub mod fetch;

/// Sync strategy selection and watermarks
pub mod sync;

/// State management
pub mod state;

/// DuckDB and Parquet output
pub mod output;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
