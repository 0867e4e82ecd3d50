//! Integration tests using a mock SAP endpoint
//!
//! Tests the full end-to-end flow: configuration file → SAP requests → DuckDB/Parquet output → state file

use pretty_assertions::assert_eq;
use sap_erp_extractor::config::{Action, ConfigFile, Configuration};
use sap_erp_extractor::engine::ExtractionEngine;
use sap_erp_extractor::output::{read_table, Cell, DUCKDB_FILE_NAME};
use sap_erp_extractor::sap::SapClient;
use sap_erp_extractor::state::StateManager;
use sap_erp_extractor::{Error, LoadType, OutputFormat, SyncType};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{basic_auth, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROWS_PATH: &str = "/DATA_SOURCES/ZORDERS";

fn rows_body(rows: serde_json::Value) -> serde_json::Value {
    json!({"DATA_SOURCE": {"ENTITIES": [{"ROWS": rows}]}})
}

async fn mount_orders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES"))
        .and(basic_auth("extractor", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DATA_SOURCES": [
                {"SOURCE_ALIAS": "ZORDERS", "SOURCE_TEXT": "Sales orders", "PAGING": true},
                {"SOURCE_ALIAS": "ZPLANTS", "SOURCE_TEXT": "", "PAGING": false}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES/ZORDERS/$metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DATA_SOURCE": {
                "SOURCE_ALIAS": "ZORDERS",
                "PAGING": true,
                "ENTITIES": [{
                    "ENTITY_ALIAS": "VBAK",
                    "DELTA_POINTER": "AEDAT",
                    "COLUMNS": [
                        {"POSITION": 3, "COLUMN_ALIAS": "AEDAT", "TYPE": "DATE", "KEY": false},
                        {"POSITION": 1, "COLUMN_ALIAS": "VBELN", "TYPE": "CHAR", "KEY": true},
                        {"POSITION": 2, "COLUMN_ALIAS": "NETWR", "TYPE": "PACKED", "DECIMALS": 2, "KEY": false}
                    ]
                }]
            }
        })))
        .mount(server)
        .await;
}

async fn mount_empty_tail(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([]))))
        .with_priority(10)
        .mount(server)
        .await;
}

fn config_file(server: &MockServer, extra_source: &serde_json::Value) -> Configuration {
    let mut source = json!({
        "resource_alias": "ZORDERS",
        "limit": 2,
        "batch_size": 3
    });
    if let (Some(source), Some(extra)) = (source.as_object_mut(), extra_source.as_object()) {
        source.extend(extra.clone());
    }

    let file = ConfigFile::from_json(
        &json!({
            "action": "run",
            "parameters": {
                "authentication": {
                    "server_url": server.uri(),
                    "username": "extractor",
                    "#password": "s3cret"
                },
                "source": source,
                "destination": {"output_table_name": "orders"},
                "http": {"max_retries": 0}
            }
        })
        .to_string(),
    )
    .unwrap();
    assert_eq!(file.action, Action::Run);
    file.parameters
}

fn engine(config: &Configuration, out: &Path, state: StateManager) -> ExtractionEngine {
    let client = SapClient::new(&config.authentication, &config.http).unwrap();
    ExtractionEngine::new(client, state, out)
}

fn duckdb_orders(out: &Path) -> Vec<(String, String)> {
    let conn = duckdb::Connection::open(out.join(DUCKDB_FILE_NAME)).unwrap();
    let mut stmt = conn
        .prepare("SELECT VBELN, CAST(NETWR AS VARCHAR) FROM orders ORDER BY VBELN")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

// ============================================================================
// Resource Listing
// ============================================================================

#[tokio::test]
async fn test_list_resources_for_ui() {
    let server = MockServer::start().await;
    mount_orders(&server).await;

    let config = config_file(&server, &json!({}));
    let client = SapClient::new(&config.authentication, &config.http).unwrap();

    let elements: Vec<_> = client
        .list_resources()
        .await
        .unwrap()
        .iter()
        .map(|r| r.to_select_element())
        .collect();

    assert_eq!(
        elements,
        vec![
            json!({"label": "Sales orders (ZORDERS)", "value": "ZORDERS"}),
            json!({"label": "ZPLANTS", "value": "ZPLANTS"}),
        ]
    );
}

#[tokio::test]
async fn test_wrong_credentials_are_user_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let config = config_file(&server, &json!({}));
    let client = SapClient::new(&config.authentication, &config.http).unwrap();

    let err = client.list_resources().await.unwrap_err();
    assert!(err.is_user_error());
    assert_eq!(err.exit_code(), 1);
}

// ============================================================================
// Offset Paging → DuckDB
// ============================================================================

#[tokio::test]
async fn test_offset_run_then_incremental_upsert_with_state_file() {
    let server = MockServer::start().await;
    mount_orders(&server).await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([
            ["4711", "100.50", "20240301"],
            ["4712", "20", "20240302"]
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([
            ["4713", "7.25-", "20240303"]
        ]))))
        .mount(&server)
        .await;
    mount_empty_tail(&server).await;

    let out = TempDir::new().unwrap();
    let state_path = out.path().join("state").join("state.json");

    // First run: full sync, overwrite
    let config = config_file(&server, &json!({}));
    let first = engine(&config, out.path(), StateManager::from_file(&state_path).unwrap());
    let report = first.run(&config).await.unwrap();
    assert_eq!(report.stats.rows_written, 3);
    assert_eq!(report.table, "orders");
    assert_eq!(
        duckdb_orders(out.path()),
        vec![
            ("4711".to_string(), "100.50".to_string()),
            ("4712".to_string(), "20.00".to_string()),
            ("4713".to_string(), "-7.25".to_string()),
        ]
    );
    assert!(state_path.exists());

    // Second run: incremental from a fresh process reading the same state file.
    // The full run stored no watermark, so nothing is filtered yet.
    server.reset().await;
    mount_orders(&server).await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .and(query_param("offset", "0"))
        .and(query_param_is_missing("changed_since"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([
            ["4712", "99.99", "20240310"],
            ["4714", "1", "20240309"]
        ]))))
        .mount(&server)
        .await;
    mount_empty_tail(&server).await;

    let mut config = config_file(
        &server,
        &json!({"sync_type": "incremental_sync", "watermark_column": "AEDAT"}),
    );
    config.destination.load_type = LoadType::IncrementalLoad;
    let second = engine(&config, out.path(), StateManager::from_file(&state_path).unwrap());
    let report = second.run(&config).await.unwrap();
    assert_eq!(report.write, "upsert on (VBELN)");
    assert_eq!(report.watermark.as_deref(), Some("20240310"));

    assert_eq!(
        duckdb_orders(out.path()),
        vec![
            ("4711".to_string(), "100.50".to_string()),
            ("4712".to_string(), "99.99".to_string()),
            ("4713".to_string(), "-7.25".to_string()),
            ("4714".to_string(), "1.00".to_string()),
        ]
    );

    let reloaded = StateManager::from_file(&state_path).unwrap();
    assert_eq!(
        reloaded.watermark_for("ZORDERS", "AEDAT").await.as_deref(),
        Some("20240310")
    );
    assert_eq!(reloaded.get_resource("ZORDERS").await.unwrap().rows_last_run, 2);
}

#[tokio::test]
async fn test_stored_watermark_is_sent_as_changed_since() {
    let server = MockServer::start().await;
    mount_orders(&server).await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .and(query_param("changed_since", "20240310"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([]))))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_tail(&server).await;

    let state = StateManager::from_json(
        &json!({
            "resources": {
                "ZORDERS": {"watermark": "20240310", "watermark_column": "AEDAT", "rows_last_run": 4}
            }
        })
        .to_string(),
    )
    .unwrap();

    let out = TempDir::new().unwrap();
    let mut config = config_file(&server, &json!({}));
    config.source.sync_type = SyncType::IncrementalSync;
    config.destination.load_type = LoadType::IncrementalLoad;
    let engine = engine(&config, out.path(), state);

    let report = engine.run(&config).await.unwrap();
    assert_eq!(report.sync, "INCREMENTAL on AEDAT since 20240310");
    assert_eq!(report.stats.rows_written, 0);
    // No rows: the stored watermark stays in place
    assert_eq!(report.watermark.as_deref(), Some("20240310"));
}

// ============================================================================
// Key Paging → Parquet
// ============================================================================

#[tokio::test]
async fn test_key_paging_into_parquet() {
    let server = MockServer::start().await;
    mount_orders(&server).await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .and(query_param("key_field", "VBELN"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([
            ["4711", "1", "20240301"],
            ["4712", "2", "20240301"]
        ]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .and(query_param("after", "4712"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([
            ["4713", "3", "20240302"]
        ]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .and(query_param("after", "4713"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let mut config = config_file(&server, &json!({"paging_method": "key"}));
    config.destination.format = OutputFormat::Parquet;
    let engine = engine(&config, out.path(), StateManager::in_memory());

    let report = engine.run(&config).await.unwrap();
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.location, out.path().join("orders.parquet"));

    let table = read_table(out.path().join("orders.parquet")).unwrap();
    assert_eq!(table.primary_key, vec!["VBELN".to_string()]);
    let keys: Vec<_> = table.rows.iter().map(|row| row[0].clone()).collect();
    assert_eq!(
        keys,
        vec![
            Cell::Text("4711".to_string()),
            Cell::Text("4712".to_string()),
            Cell::Text("4713".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_malformed_row_fails_without_output() {
    let server = MockServer::start().await;
    mount_orders(&server).await;
    Mock::given(method("GET"))
        .and(path(ROWS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(json!([
            ["4711", "not a number", "20240301"]
        ]))))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let mut config = config_file(&server, &json!({}));
    config.destination.format = OutputFormat::Parquet;
    let engine = engine(&config, out.path(), StateManager::in_memory());

    let err = engine.run(&config).await.unwrap_err();
    match err {
        Error::InvalidValue { column, .. } => assert_eq!(column, "NETWR"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.path().join("orders.parquet").exists());
    assert!(!out.path().join("orders.parquet.tmp").exists());
}
