//! CLI commands and argument parsing

use crate::config::ConfigFile;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SAP ERP data extractor
#[derive(Parser, Debug)]
#[command(name = "sap-erp-extractor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON or YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline configuration JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Directory receiving output tables
    #[arg(short, long, global = true, default_value = "out")]
    pub output_dir: PathBuf,

    /// Message format on stdout
    #[arg(short, long, global = true, default_value = "json")]
    pub format: MessageFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether debug logging was asked for on the command line or in the
    /// configuration
    pub fn debug_requested(&self) -> bool {
        if self.verbose {
            return true;
        }
        if let Some(json) = &self.config_json {
            return ConfigFile::from_json(json).is_ok_and(|c| c.parameters.debug);
        }
        self.config.as_ref().is_some_and(ConfigFile::peek_debug)
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Perform the action named in the configuration file
    Exec,

    /// Extract the configured resource into the output table
    Run,

    /// List extractable resources
    ListResources,

    /// Test the connection to the SAP endpoint
    Check,

    /// Print the configuration schemas
    Spec,

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Format of messages printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MessageFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sap-erp-extractor",
            "run",
            "--config",
            "config.json",
            "--output-dir",
            "/data/out",
            "-v",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.config, Some(PathBuf::from("config.json")));
        assert_eq!(cli.output_dir, PathBuf::from("/data/out"));
        assert!(cli.debug_requested());
    }

    #[test]
    fn test_serve_port_and_defaults() {
        let cli = Cli::try_parse_from(["sap-erp-extractor", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: 9000 }));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert_eq!(cli.format, MessageFormat::Json);
        assert!(!cli.debug_requested());
    }

    #[test]
    fn test_debug_flag_from_inline_config() {
        let cli = Cli::try_parse_from([
            "sap-erp-extractor",
            "exec",
            "--config-json",
            r#"{"action": "run", "parameters": {"debug": true}}"#,
        ])
        .unwrap();
        assert!(cli.debug_requested());
    }
}
