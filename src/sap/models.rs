//! SAP data source wire models
//!
//! Field names follow the upper-case keys of the SAP data source API.

use crate::error::{Error, Result};
use crate::types::{JsonValue, RawRow};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

/// An extractable data source, as listed by `DATA_SOURCES`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Alias used in URLs and configuration
    #[serde(rename = "SOURCE_ALIAS")]
    pub alias: String,
    /// Human readable description
    #[serde(rename = "SOURCE_TEXT", default)]
    pub text: String,
    /// Whether the source supports paging
    #[serde(rename = "PAGING", default)]
    pub paging: bool,
}

impl ResourceInfo {
    /// Select element for the configuration UI
    pub fn to_select_element(&self) -> JsonValue {
        let label = if self.text.trim().is_empty() {
            self.alias.clone()
        } else {
            format!("{} ({})", self.text.trim(), self.alias)
        };
        json!({ "label": label, "value": self.alias })
    }
}

/// Response of `GET DATA_SOURCES`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSourceList {
    /// Listed sources; absent when the system exposes none
    #[serde(rename = "DATA_SOURCES", default)]
    pub data_sources: Option<Vec<ResourceInfo>>,
}

/// Column description from the `$metadata` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Position within a row (rows are ordered by this)
    #[serde(rename = "POSITION")]
    pub position: i64,
    /// Column name
    #[serde(rename = "COLUMN_ALIAS")]
    pub alias: String,
    /// Description
    #[serde(rename = "COLUMN_TEXT", default)]
    pub text: String,
    /// SAP ABAP type, e.g. `CHAR` or `PACKED`
    #[serde(rename = "TYPE", default)]
    pub sap_type: String,
    /// Declared length
    #[serde(rename = "LENGTH", default)]
    pub length: Option<u32>,
    /// Declared decimals for packed numbers
    #[serde(rename = "DECIMALS", default)]
    pub decimals: Option<u32>,
    /// Part of the primary key
    #[serde(rename = "KEY", default)]
    pub key: bool,
}

/// Entity of a data source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Entity name
    #[serde(rename = "ENTITY_ALIAS", default)]
    pub alias: String,
    /// Column holding the change pointer, if the entity supports delta
    #[serde(rename = "DELTA_POINTER", default)]
    pub delta_pointer: Option<String>,
    /// Columns in arbitrary order
    #[serde(rename = "COLUMNS", default)]
    pub columns: Vec<ColumnSpec>,
}

/// Body of `GET DATA_SOURCES/{alias}/$metadata` under `DATA_SOURCE`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceMetadata {
    /// Alias
    #[serde(rename = "SOURCE_ALIAS", default)]
    pub alias: String,
    /// Description
    #[serde(rename = "SOURCE_TEXT", default)]
    pub text: String,
    /// Source type
    #[serde(rename = "SOURCE_TYPE", default)]
    pub source_type: String,
    /// Whether the source supports paging
    #[serde(rename = "PAGING", default)]
    pub paging: bool,
    /// Whether the source supports delta extraction
    #[serde(rename = "DELTA", default)]
    pub delta: bool,
    /// Entities; only the first is extracted
    #[serde(rename = "ENTITIES", default)]
    pub entities: Vec<EntityMetadata>,
}

/// Wrapper of the `$metadata` response
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataResponse {
    /// The described data source
    #[serde(rename = "DATA_SOURCE")]
    pub data_source: Option<DataSourceMetadata>,
}

/// Resolved shape of a resource: columns ordered by position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Resource alias
    pub alias: String,
    /// Whether page requests are supported
    pub paging: bool,
    /// Change pointer column of the entity
    pub delta_pointer: Option<String>,
    /// Columns in row order
    pub columns: Vec<ColumnSpec>,
}

impl ResourceSchema {
    /// Resolve a schema from `$metadata`, using the first entity only
    pub fn from_metadata(alias: &str, metadata: DataSourceMetadata) -> Result<Self> {
        let entity = metadata.entities.into_iter().next().ok_or_else(|| {
            Error::metadata(alias, "column metadata not available, cannot store data")
        })?;

        if entity.columns.is_empty() {
            return Err(Error::metadata(alias, "entity has no columns"));
        }

        let mut columns = entity.columns;
        columns.sort_by_key(|c| c.position);

        let mut seen = HashSet::new();
        for column in &columns {
            if column.alias.trim().is_empty() {
                return Err(Error::metadata(
                    alias,
                    format!("column at position {} has no name", column.position),
                ));
            }
            if !seen.insert(column.alias.as_str()) {
                return Err(Error::metadata(
                    alias,
                    format!("duplicate column '{}'", column.alias),
                ));
            }
        }

        let delta_pointer = entity
            .delta_pointer
            .filter(|p| !p.trim().is_empty());

        Ok(Self {
            alias: alias.to_string(),
            paging: metadata.paging,
            delta_pointer,
            columns,
        })
    }

    /// Number of values in each row
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column in each row
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.alias == name)
    }

    /// Columns flagged as key by SAP
    pub fn key_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.key)
            .map(|c| c.alias.clone())
            .collect()
    }
}

/// Decode the rows of a page response.
///
/// `{"DATA_SOURCE": {"ENTITIES": [{"ROWS": [[...], ...]}]}}`; empty or
/// absent entities are an empty page, an entity without `ROWS` is malformed.
pub fn decode_rows(endpoint: &str, body: &JsonValue, width: usize) -> Result<Vec<RawRow>> {
    let data_source = body
        .get("DATA_SOURCE")
        .filter(|v| v.is_object())
        .ok_or_else(|| Error::decode(endpoint, "missing DATA_SOURCE object"))?;

    let entity = match data_source.get("ENTITIES") {
        None | Some(JsonValue::Null) => return Ok(Vec::new()),
        Some(JsonValue::Array(entities)) => match entities.first() {
            Some(entity) => entity,
            None => return Ok(Vec::new()),
        },
        Some(_) => return Err(Error::decode(endpoint, "ENTITIES is not an array")),
    };

    let rows = match entity.get("ROWS") {
        None | Some(JsonValue::Null) => return Err(Error::decode(endpoint, "entity has no ROWS")),
        Some(JsonValue::Array(rows)) => rows,
        Some(_) => return Err(Error::decode(endpoint, "ROWS is not an array")),
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| match row {
            JsonValue::Array(values) if values.len() == width => Ok(values.clone()),
            JsonValue::Array(values) => Err(Error::decode(
                endpoint,
                format!("row {i} has {} values, expected {width}", values.len()),
            )),
            _ => Err(Error::decode(endpoint, format!("row {i} is not an array"))),
        })
        .collect()
}
