//! Extraction engine
//!
//! Runs one extraction: resolve the resource, choose the sync strategy, page
//! through the rows, write them, then commit the output and the watermark.
//!
//! Cancellation and the run timeout only interrupt the fetch phase. Whatever
//! interrupts it, the writer is rolled back and the stored watermark is left
//! as it was.

mod types;

pub use types::{RunReport, RunStats};

use crate::config::{Configuration, SourceConfig};
use crate::error::{Error, Result};
use crate::fetch::{fetch_pages, FetchPlan, PagingPlan};
use crate::output::{open_writer, OutputWriter, TableSpec, WriteStrategy};
use crate::pagination::{PageCursor, PageRequest};
use crate::sap::{ResourceSchema, SapClient};
use crate::state::StateManager;
use crate::sync::{select_strategy, SyncPlan, WatermarkTracker};
use crate::types::PagingMethod;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestrates extraction runs
pub struct ExtractionEngine {
    /// SAP endpoint
    client: SapClient,
    /// Watermark store
    state: StateManager,
    /// Directory receiving output tables
    output_dir: PathBuf,
    /// Shutdown signal
    cancel: CancellationToken,
}

/// Rows fetched and staged, waiting for commit
struct Staged {
    resource: String,
    plan: SyncPlan,
    tracker: Option<WatermarkTracker>,
    strategy: WriteStrategy,
    stats: RunStats,
}

impl ExtractionEngine {
    /// Create a new engine
    pub fn new(client: SapClient, state: StateManager, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            state,
            output_dir: output_dir.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop runs when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Directory receiving output tables
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run an extraction into the configured output format
    pub async fn run(&self, config: &Configuration) -> Result<RunReport> {
        let writer = open_writer(config.destination.format, &self.output_dir)?;
        self.run_with_writer(config, writer).await
    }

    /// Run an extraction into `writer`
    pub async fn run_with_writer(
        &self,
        config: &Configuration,
        mut writer: Box<dyn OutputWriter>,
    ) -> Result<RunReport> {
        config.validate()?;
        let start = Instant::now();

        let staged = tokio::select! {
            result = self.stage(config, writer.as_mut()) => result,
            () = self.cancel.cancelled() => Err(Error::cancelled("shutdown requested")),
            () = run_deadline(config.http.run_timeout()) => Err(Error::cancelled(format!(
                "run exceeded {}s",
                config.http.run_timeout().unwrap_or_default().as_secs()
            ))),
        };

        let mut staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                warn!(error = %e, "Run failed, discarding written rows");
                if let Err(rollback) = writer.rollback() {
                    warn!(error = %rollback, "Rollback failed");
                }
                return Err(e);
            }
        };

        let summary = writer.commit()?;
        let watermark = staged.tracker.take().and_then(WatermarkTracker::into_commit);
        self.state
            .record_run(&staged.resource, watermark.clone(), summary.rows_written)
            .await?;

        #[allow(clippy::cast_possible_truncation)]
        staged.stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            resource = %staged.resource,
            table = %summary.table,
            rows = summary.rows_written,
            pages = staged.stats.pages_fetched,
            duration_ms = staged.stats.duration_ms,
            "Run complete"
        );

        Ok(RunReport {
            resource: staged.resource,
            table: summary.table,
            sync: staged.plan.to_string(),
            write: staged.strategy.to_string(),
            watermark: watermark.map(|(_, value)| value),
            location: summary.location,
            stats: staged.stats,
        })
    }

    /// Fetch every page and hand it to the writer without committing
    async fn stage(&self, config: &Configuration, writer: &mut dyn OutputWriter) -> Result<Staged> {
        let alias = config.source.resource_alias.trim().to_string();

        // Fails fast when the alias is not listed
        self.client.find_resource(&alias).await?;
        let schema = self.client.resource_schema(&alias).await?;
        let table =
            TableSpec::from_resource(config.table_name(), &schema, &config.destination.primary_key)?;

        let stored = self.state.get_resource(&alias).await;
        let stored = stored
            .as_ref()
            .and_then(|r| Some((r.watermark_column.as_deref()?, r.watermark.as_deref()?)));
        let plan = select_strategy(&config.source, &schema, stored)?;
        let fetch_plan = build_fetch_plan(&config.source, &schema, &plan)?;

        info!(
            resource = %alias,
            table = %table.name,
            sync = %plan,
            paging = ?fetch_plan.paging,
            "Starting extraction"
        );

        let strategy = writer.begin(&table, config.destination.load_type)?;
        let mut tracker = plan.tracker();
        let mut stats = RunStats::new();

        let source = self.client.pages(&schema);
        let mut pages = fetch_pages(&source, fetch_plan);
        while let Some(page) = pages.next().await {
            let page = page?;
            let cells = table.convert_rows(&page.rows)?;
            if let Some(tracker) = tracker.as_mut() {
                tracker.observe(&page.rows);
            }
            let written = writer.write(&cells)?;
            stats.add_page(page.len(), written);
            debug!(
                cursor = %page.request.cursor,
                rows = page.len(),
                total = stats.rows_fetched,
                "Page written"
            );
        }

        Ok(Staged {
            resource: alias,
            plan,
            tracker,
            strategy,
            stats,
        })
    }
}

/// Decide how the resource is paged
pub fn build_fetch_plan(
    source: &SourceConfig,
    schema: &ResourceSchema,
    plan: &SyncPlan,
) -> Result<FetchPlan> {
    let delta = plan.delta_filter();

    if !schema.paging {
        debug!("'{}' does not support paging, fetching in one request", schema.alias);
        return Ok(FetchPlan {
            paging: PagingPlan::Unpaged,
            template: PageRequest::new(PageCursor::Unpaged, source.limit).with_delta(delta),
        });
    }

    match source.paging_method {
        PagingMethod::Offset => Ok(FetchPlan {
            paging: PagingPlan::Offset {
                batch_size: source.batch_size,
            },
            template: PageRequest::new(PageCursor::Offset(0), source.limit).with_delta(delta),
        }),
        PagingMethod::Key => {
            let key_field = match source.paging_key() {
                Some(key) => key,
                None => schema.key_columns().into_iter().next().ok_or_else(|| {
                    Error::invalid_value(
                        "source.paging_key",
                        format!("'{}' has no key columns, set paging_key", schema.alias),
                    )
                })?,
            };
            let key_index = schema.column_index(&key_field).ok_or_else(|| {
                Error::invalid_value(
                    "source.paging_key",
                    format!("'{key_field}' is not a column of '{}'", schema.alias),
                )
            })?;
            if source.batch_size > 1 {
                debug!("Key paging is sequential, batch_size {} ignored", source.batch_size);
            }
            Ok(FetchPlan {
                paging: PagingPlan::Key {
                    key_field,
                    key_index,
                },
                template: PageRequest::new(PageCursor::Key(None), source.limit).with_delta(delta),
            })
        }
    }
}

async fn run_deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}
