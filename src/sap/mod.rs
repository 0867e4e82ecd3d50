//! SAP data source API
//!
//! Listing of extractable resources, column metadata, and page decoding.

mod client;
mod models;

pub use client::{ResourcePages, SapClient};
pub use models::{
    decode_rows, ColumnSpec, DataSourceList, DataSourceMetadata, EntityMetadata,
    MetadataResponse, ResourceInfo, ResourceSchema,
};
