//! Client for the SAP data source API

use super::models::{decode_rows, DataSourceList, MetadataResponse, ResourceInfo, ResourceSchema};
use crate::auth::AuthConfig;
use crate::config::{ConnectionConfig, HttpSettings};
use crate::error::{Error, Result};
use crate::fetch::PageSource;
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::pagination::PageRequest;
use crate::types::{JsonValue, RawRow};
use async_trait::async_trait;
use tracing::{debug, info};

const DATA_SOURCES_ENDPOINT: &str = "DATA_SOURCES";
const METADATA_ENDPOINT: &str = "$metadata";

/// Client for one SAP system
#[derive(Debug)]
pub struct SapClient {
    http: HttpClient,
}

impl SapClient {
    /// Build a client from the connection and transport settings
    pub fn new(conn: &ConnectionConfig, settings: &HttpSettings) -> Result<Self> {
        let config = HttpClientConfig::from_settings(conn, settings);
        let http = HttpClient::with_auth(config, AuthConfig::from_connection(conn))?;
        Ok(Self { http })
    }

    /// List extractable data sources
    pub async fn list_resources(&self) -> Result<Vec<ResourceInfo>> {
        let list: DataSourceList = self
            .http
            .get_json(DATA_SOURCES_ENDPOINT, RequestConfig::new())
            .await?;
        let resources = list.data_sources.unwrap_or_default();
        debug!("SAP endpoint lists {} data sources", resources.len());
        Ok(resources)
    }

    /// Verify credentials and connectivity; returns the number of listed sources
    pub async fn check_connection(&self) -> Result<usize> {
        let resources = self.list_resources().await?;
        info!("Connection OK, {} data sources available", resources.len());
        Ok(resources.len())
    }

    /// Find a listed resource by alias
    pub async fn find_resource(&self, alias: &str) -> Result<ResourceInfo> {
        self.list_resources()
            .await?
            .into_iter()
            .find(|r| r.alias == alias)
            .ok_or_else(|| Error::ResourceNotFound {
                alias: alias.to_string(),
            })
    }

    /// Fetch and resolve the column layout of a resource
    pub async fn resource_schema(&self, alias: &str) -> Result<ResourceSchema> {
        let endpoint = metadata_endpoint(alias);
        let response: MetadataResponse = self.http.get_json(&endpoint, RequestConfig::new()).await?;
        let metadata = response
            .data_source
            .ok_or_else(|| Error::metadata(alias, "response has no DATA_SOURCE"))?;
        let schema = ResourceSchema::from_metadata(alias, metadata)?;
        debug!(
            "Resource {alias}: {} columns, paging={}, delta_pointer={:?}",
            schema.width(),
            schema.paging,
            schema.delta_pointer
        );
        Ok(schema)
    }

    /// Fetch the rows of one page
    pub async fn fetch_rows(&self, schema: &ResourceSchema, request: &PageRequest) -> Result<Vec<RawRow>> {
        let endpoint = data_endpoint(&schema.alias);
        let mut config = RequestConfig::new();
        for (key, value) in request.query_params() {
            config = config.query(key, value);
        }

        debug!("Fetching {endpoint} ({})", request.cursor);
        let body: JsonValue = self.http.get_json(&endpoint, config).await?;
        decode_rows(&endpoint, &body, schema.width())
    }

    /// Page source bound to one resource
    pub fn pages<'a>(&'a self, schema: &'a ResourceSchema) -> ResourcePages<'a> {
        ResourcePages {
            client: self,
            schema,
        }
    }
}

/// Pages of a single resource
#[derive(Debug, Clone, Copy)]
pub struct ResourcePages<'a> {
    client: &'a SapClient,
    schema: &'a ResourceSchema,
}

#[async_trait]
impl PageSource for ResourcePages<'_> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<RawRow>> {
        self.client.fetch_rows(self.schema, request).await
    }
}

fn data_endpoint(alias: &str) -> String {
    join_url_parts(&[DATA_SOURCES_ENDPOINT, alias])
}

fn metadata_endpoint(alias: &str) -> String {
    join_url_parts(&[DATA_SOURCES_ENDPOINT, alias, METADATA_ENDPOINT])
}

fn join_url_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}
