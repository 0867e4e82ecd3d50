//! CLI module
//!
//! Command-line interface and HTTP server mode.
//!
//! # Commands
//!
//! - `exec` - Perform the action named in the configuration file
//! - `run` - Extract the configured resource
//! - `list-resources` - List extractable resources
//! - `check` - Test the connection
//! - `spec` - Print the configuration schemas
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;
mod shutdown;

pub use commands::{Cli, Commands, MessageFormat};
pub use runner::Runner;
pub use server::{router, serve};
pub use shutdown::ShutdownCoordinator;
