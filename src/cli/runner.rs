//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, MessageFormat};
use crate::config::{authentication_schema, row_schema, Action, ConfigFile, Configuration};
use crate::engine::ExtractionEngine;
use crate::error::{Error, Result};
use crate::sap::{ResourceInfo, SapClient};
use crate::state::StateManager;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
    shutdown: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stop running work when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Exec => {
                let file = self.load_config()?;
                debug!(action = ?file.action, "Dispatching configured action");
                match file.action {
                    Action::Run => self.extract(&file.parameters).await,
                    Action::ListResources => self.list_resources(&file.parameters).await,
                    Action::TestConnection => self.check(&file.parameters).await,
                }
            }
            Commands::Run => self.extract(&self.load_config()?.parameters).await,
            Commands::ListResources => self.list_resources(&self.load_config()?.parameters).await,
            Commands::Check => self.check(&self.load_config()?.parameters).await,
            Commands::Spec => {
                self.spec();
                Ok(())
            }
            Commands::Serve { port } => crate::cli::serve(*port, self.shutdown.clone()).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<ConfigFile> {
        // Inline config takes precedence
        if let Some(json) = &self.cli.config_json {
            return ConfigFile::from_json(json);
        }
        match &self.cli.config {
            Some(path) => ConfigFile::load(path),
            None => Err(Error::config(
                "Configuration not specified (use --config or --config-json)",
            )),
        }
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        match &self.cli.state {
            Some(path) => StateManager::from_file(path),
            None => Ok(StateManager::in_memory()),
        }
    }

    /// Extract the configured resource
    async fn extract(&self, config: &Configuration) -> Result<()> {
        config.validate()?;
        let client = SapClient::new(&config.authentication, &config.http)?;
        let state = self.load_state()?;
        if state.is_in_memory() {
            info!("No state file given, incremental runs will start from scratch");
        }

        let engine = ExtractionEngine::new(client, state, &self.cli.output_dir)
            .with_cancellation(self.shutdown.clone());
        let report = engine.run(config).await?;

        self.output_message(&json!({
            "type": "RUN_REPORT",
            "report": serde_json::to_value(&report)?,
        }));
        Ok(())
    }

    /// List extractable resources as select elements
    async fn list_resources(&self, config: &Configuration) -> Result<()> {
        let elements = list_select_elements(config).await?;
        self.output_message(&Value::Array(elements));
        Ok(())
    }

    /// Check connection
    async fn check(&self, config: &Configuration) -> Result<()> {
        match check_connection(config).await {
            Ok(count) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": format!("Connection successful, {count} data sources available")
                    }
                }));
                Ok(())
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
                Err(e)
            }
        }
    }

    /// Print the configuration schemas
    fn spec(&self) {
        self.output_message(&spec_document());
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            MessageFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            MessageFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Configuration schemas for the configuration UI
pub(crate) fn spec_document() -> Value {
    json!({
        "type": "SPEC",
        "spec": {
            "authentication": authentication_schema(),
            "row": row_schema(),
        }
    })
}

/// Listed resources as `{label, value}` select elements
pub(crate) async fn list_select_elements(config: &Configuration) -> Result<Vec<Value>> {
    config.validate_connection()?;
    let client = SapClient::new(&config.authentication, &config.http)?;
    let resources = client
        .list_resources()
        .await
        .map_err(|e| configuration_time_error("Failed to list resources", e))?;
    Ok(resources.iter().map(ResourceInfo::to_select_element).collect())
}

/// Number of listed data sources, as proof of a working connection
pub(crate) async fn check_connection(config: &Configuration) -> Result<usize> {
    config.validate_connection()?;
    let client = SapClient::new(&config.authentication, &config.http)?;
    client
        .check_connection()
        .await
        .map_err(|e| configuration_time_error("Connection check failed", e))
}

/// Configuration-time failures are reported as user errors
fn configuration_time_error(context: &str, e: Error) -> Error {
    if e.is_user_error() {
        e
    } else {
        Error::config(format!("{context}: {e}"))
    }
}
