//! Configuration for extraction runs
//!
//! The configuration file carries an `action` and a `parameters` object with
//! `authentication`, `source`, `destination` and `http` sections. Secrets use
//! the `#password` key. JSON and YAML files are both accepted.

use crate::error::{Error, Result};
use crate::types::{AuthType, LoadType, OptionStringExt, OutputFormat, PagingMethod, SyncType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// Table names must be safe both as SQL identifiers and as file names
static TABLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-]{0,127}$").unwrap());

/// Characters replaced when deriving a table name from a resource alias
static TABLE_NAME_INVALID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").unwrap());

// ============================================================================
// Action
// ============================================================================

/// Action requested by the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    /// Extract and load data
    #[default]
    #[serde(rename = "run")]
    Run,
    /// List extractable resources for the configuration UI
    #[serde(rename = "listResources", alias = "listTables")]
    ListResources,
    /// Verify credentials and connectivity
    #[serde(rename = "testConnection")]
    TestConnection,
}

// ============================================================================
// Connection Config
// ============================================================================

/// Connection settings for the SAP endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the SAP data source API
    #[serde(default)]
    pub server_url: String,

    /// Username
    #[serde(default)]
    pub username: String,

    /// Password (stored under `#password` in encrypted configurations)
    #[serde(default, rename = "#password", alias = "password")]
    pub password: String,

    /// Whether to verify TLS certificates
    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    /// Credential scheme
    #[serde(default)]
    pub auth_type: AuthType,

    /// Path of the token endpoint for token auth, relative to `server_url`
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("verify_ssl", &self.verify_ssl)
            .field("auth_type", &self.auth_type)
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            username: String::new(),
            password: String::new(),
            verify_ssl: true,
            auth_type: AuthType::Basic,
            token_endpoint: default_token_endpoint(),
        }
    }
}

impl ConnectionConfig {
    /// Create a basic-auth connection config
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Validate the connection settings
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(Error::missing_field("authentication.server_url"));
        }
        let url = url::Url::parse(&self.server_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "authentication.server_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(Error::missing_field("authentication.username"));
        }
        if self.password.is_empty() {
            return Err(Error::missing_field("authentication.#password"));
        }
        if self.auth_type == AuthType::Token && self.token_endpoint.trim().is_empty() {
            return Err(Error::invalid_value(
                "authentication.token_endpoint",
                "required when auth_type is 'token'",
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_token_endpoint() -> String {
    "token".to_string()
}

// ============================================================================
// Source Config
// ============================================================================

/// What to extract and how to page through it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Alias of the SAP data source
    #[serde(default)]
    pub resource_alias: String,

    /// Rows per page
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Maximum page requests in flight
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Full or incremental extraction
    #[serde(default, alias = "sync_mode")]
    pub sync_type: SyncType,

    /// Offset or key paging
    #[serde(default)]
    pub paging_method: PagingMethod,

    /// Ordering key for key paging (defaults to the first key column)
    #[serde(default)]
    pub paging_key: Option<String>,

    /// Column tracked as the incremental watermark (defaults to the
    /// entity's delta pointer)
    #[serde(default)]
    pub watermark_column: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            resource_alias: String::new(),
            limit: default_limit(),
            batch_size: default_batch_size(),
            sync_type: SyncType::default(),
            paging_method: PagingMethod::default(),
            paging_key: None,
            watermark_column: None,
        }
    }
}

impl SourceConfig {
    /// Create a source config for a resource with default paging
    pub fn new(resource_alias: impl Into<String>) -> Self {
        Self {
            resource_alias: resource_alias.into(),
            ..Default::default()
        }
    }

    /// Validate the source settings
    pub fn validate(&self) -> Result<()> {
        if self.resource_alias.trim().is_empty() {
            return Err(Error::missing_field("source.resource_alias"));
        }
        if self.limit == 0 {
            return Err(Error::invalid_value("source.limit", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_value(
                "source.batch_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Explicit paging key, ignoring blank values
    pub fn paging_key(&self) -> Option<String> {
        self.paging_key.clone().none_if_empty()
    }

    /// Explicit watermark column, ignoring blank values
    pub fn watermark_column(&self) -> Option<String> {
        self.watermark_column.clone().none_if_empty()
    }
}

fn default_limit() -> u32 {
    10_000
}

fn default_batch_size() -> usize {
    2
}

// ============================================================================
// Destination Config
// ============================================================================

/// Where extracted rows land
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Output table name (defaults to the resource alias)
    #[serde(default)]
    pub output_table_name: String,

    /// Overwrite or incremental write
    #[serde(default)]
    pub load_type: LoadType,

    /// Primary key override; empty means the source key columns
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Output storage
    #[serde(default)]
    pub format: OutputFormat,
}

impl DestinationConfig {
    /// Resolve the output table name, deriving it from the alias when unset
    pub fn table_name(&self, resource_alias: &str) -> String {
        match self.output_table_name.clone().none_if_empty() {
            Some(name) => name.trim().to_string(),
            None => {
                let derived = TABLE_NAME_INVALID_RE.replace_all(resource_alias.trim(), "_");
                derived.trim_matches('_').to_string()
            }
        }
    }

    /// Validate the destination settings against the resolved table name
    pub fn validate(&self, resource_alias: &str) -> Result<()> {
        let name = self.table_name(resource_alias);
        if !TABLE_NAME_RE.is_match(&name) {
            return Err(Error::invalid_value(
                "destination.output_table_name",
                format!("'{name}' is not a valid table name"),
            ));
        }
        if self.primary_key.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::invalid_value(
                "destination.primary_key",
                "column names cannot be empty",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// Transport tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional client-side rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Optional limit on the whole run
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: None,
            run_timeout_secs: None,
        }
    }
}

impl HttpSettings {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Run timeout, if any
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    300
}

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Parameters of an extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Connection settings
    #[serde(default)]
    pub authentication: ConnectionConfig,

    /// Source selection
    #[serde(default)]
    pub source: SourceConfig,

    /// Destination selection
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Transport tuning
    #[serde(default)]
    pub http: HttpSettings,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,
}

impl Configuration {
    /// Validate everything a run needs
    pub fn validate(&self) -> Result<()> {
        self.authentication.validate()?;
        self.source.validate()?;
        self.destination.validate(&self.source.resource_alias)?;
        Ok(())
    }

    /// Validate only what configuration-time actions need
    pub fn validate_connection(&self) -> Result<()> {
        self.authentication.validate()
    }

    /// Resolved output table name
    pub fn table_name(&self) -> String {
        self.destination.table_name(&self.source.resource_alias)
    }
}

/// A configuration file: action plus parameters
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Requested action
    pub action: Action,
    /// Run parameters
    pub parameters: Configuration,
}

impl ConfigFile {
    /// Parse a configuration document.
    ///
    /// Accepts `{"action": ..., "parameters": {...}}` or a bare parameters
    /// object.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::config("Configuration must be an object"));
        };

        if let Some(parameters) = map.remove("parameters") {
            let action = match map.remove("action") {
                None | Some(Value::Null) => Action::Run,
                Some(Value::String(s)) if s.is_empty() => Action::Run,
                Some(action) => serde_json::from_value(action.clone()).map_err(|_| {
                    Error::invalid_value("action", format!("unknown action {action}"))
                })?,
            };
            let parameters = serde_json::from_value(parameters)
                .map_err(|e| Error::config(format!("Invalid parameters: {e}")))?;
            Ok(Self { action, parameters })
        } else {
            let parameters = serde_json::from_value(Value::Object(map))
                .map_err(|e| Error::config(format!("Invalid parameters: {e}")))?;
            Ok(Self {
                action: Action::Run,
                parameters,
            })
        }
    }

    /// Parse a JSON configuration string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Parse a YAML configuration string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid config YAML: {e}")))?;
        Self::from_value(value)
    }

    /// Load a configuration file, choosing the parser by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Read only the `debug` flag, ignoring any error
    pub fn peek_debug(path: impl AsRef<Path>) -> bool {
        Self::load(path).is_ok_and(|c| c.parameters.debug)
    }
}

// ============================================================================
// Configuration Schemas (for UI)
// ============================================================================

/// JSON schema of the authentication section
pub fn authentication_schema() -> Value {
    json!({
        "type": "object",
        "title": "Authentication",
        "required": ["server_url", "username", "#password"],
        "properties": {
            "server_url": {"type": "string", "title": "Server URL", "format": "uri", "propertyOrder": 1},
            "username": {"type": "string", "title": "Username", "propertyOrder": 2},
            "#password": {"type": "string", "title": "Password", "format": "password", "propertyOrder": 3},
            "verify_ssl": {"type": "boolean", "title": "Verify SSL certificate", "default": true, "propertyOrder": 4},
            "auth_type": {"type": "string", "title": "Authentication type", "enum": ["basic", "token"], "default": "basic", "propertyOrder": 5},
            "token_endpoint": {"type": "string", "title": "Token endpoint", "default": "token", "propertyOrder": 6}
        }
    })
}

/// JSON schema of the source/destination sections
pub fn row_schema() -> Value {
    json!({
        "type": "object",
        "title": "Row configuration",
        "required": ["source", "destination"],
        "properties": {
            "source": {
                "type": "object",
                "title": "Source",
                "required": ["resource_alias"],
                "properties": {
                    "resource_alias": {"type": "string", "title": "Resource", "options": {"async": {"action": "listResources"}}},
                    "limit": {"type": "integer", "title": "Page size", "default": 10_000, "minimum": 1},
                    "batch_size": {"type": "integer", "title": "Concurrent requests", "default": 2, "minimum": 1},
                    "sync_type": {"type": "string", "title": "Sync type", "enum": ["full_sync", "incremental_sync"], "default": "full_sync"},
                    "paging_method": {"type": "string", "title": "Paging method", "enum": ["offset", "key"], "default": "offset"},
                    "paging_key": {"type": "string", "title": "Paging key column"},
                    "watermark_column": {"type": "string", "title": "Watermark column"}
                }
            },
            "destination": {
                "type": "object",
                "title": "Destination",
                "properties": {
                    "output_table_name": {"type": "string", "title": "Output table name"},
                    "load_type": {"type": "string", "title": "Load type", "enum": ["full_load", "incremental_load"], "default": "full_load"},
                    "primary_key": {"type": "array", "title": "Primary key", "items": {"type": "string"}},
                    "format": {"type": "string", "title": "Format", "enum": ["duckdb", "parquet"], "default": "duckdb"}
                }
            }
        }
    })
}
