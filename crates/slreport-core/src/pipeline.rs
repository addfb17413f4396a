//! Runs one report from arrival to committed tables.
//!
//! Stages advance `Validating → Fetching → Archiving → Extracting →
//! Committing → Done`. Naming and fetch failures end the run as
//! [`RunOutcome::Aborted`] with nothing written; anything after the raw copy
//! is archived surfaces as an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use slreport_bucket::{BucketError, BucketStore, ObjectLocator};
use slreport_parser::{extract_all, validate_name, CalamineWorkbook, Entity, Site};
use tokio::task;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::lineage::{enrich, ExtractedTable};
use crate::metadata::{ArtifactReference, ReportMetadata, RunContext, StorageEvent};
use crate::outputs::{archive_key, export_key, ExportFormat};
use crate::warehouse::{TableName, WarehouseSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Validating,
    Fetching,
    Archiving,
    Extracting,
    Committing,
    Done,
    Aborted,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Validating => "validating",
            RunStage::Fetching => "fetching",
            RunStage::Archiving => "archiving",
            RunStage::Extracting => "extracting",
            RunStage::Committing => "committing",
            RunStage::Done => "done",
            RunStage::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommittedTable {
    pub entity: Entity,
    pub table: String,
    pub rows: u64,
    pub csv_key: Option<String>,
    pub snapshot_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub filename: String,
    pub site: Site,
    pub report_date: NaiveDate,
    pub content_hash: String,
    pub upload_timestamp: DateTime<Utc>,
    pub archive_key: Option<String>,
    pub tables: Vec<CommittedTable>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunReport),
    /// Stopped before anything was written. `stage` is where it stopped.
    Aborted { stage: RunStage, reason: String },
}

impl RunOutcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::Aborted { .. } => None,
        }
    }
}

pub struct ReportPipeline {
    store: Arc<dyn BucketStore>,
    warehouse: Arc<dyn WarehouseSink>,
    config: PipelineConfig,
}

impl ReportPipeline {
    pub fn new(
        store: Arc<dyn BucketStore>,
        warehouse: Arc<dyn WarehouseSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            warehouse,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Entry point for a storage trigger. The run clock starts here.
    pub async fn handle_event(&self, event: StorageEvent) -> Result<RunOutcome> {
        self.run(ArtifactReference::from(event), RunContext::now()).await
    }

    pub async fn run(&self, mut artifact: ArtifactReference, run: RunContext) -> Result<RunOutcome> {
        let filename = artifact.filename().to_string();
        let source = artifact.locator.clone();

        info!(stage = RunStage::Validating.as_str(), filename = %filename, object = %source, "received report");
        if !validate_name(&filename) {
            return Ok(abort(RunStage::Validating, PipelineError::Naming(filename)));
        }

        info!(stage = RunStage::Fetching.as_str(), filename = %filename, "fetching report");
        let contents = match self.store.get_object(&source).await {
            Ok(contents) => &*artifact.contents.insert(contents),
            Err(source_err) => {
                let err = PipelineError::Fetch {
                    locator: source,
                    source: source_err,
                };
                return Ok(abort(RunStage::Fetching, err));
            }
        };
        let working = match WorkingCopy::write(&self.config.work_dir, &filename, contents).await {
            Ok(working) => working,
            Err(io_err) => {
                let err = PipelineError::Fetch {
                    locator: source,
                    source: BucketError::Io(io_err),
                };
                return Ok(abort(RunStage::Fetching, err));
            }
        };

        let archive_bucket = self.config.archive_bucket(&source.bucket);
        let archived = ObjectLocator::new(archive_bucket.clone(), archive_key(&run, &filename));
        info!(stage = RunStage::Archiving.as_str(), filename = %filename, archive = %archived, "archiving raw copy");
        self.store
            .copy_object(&source, &archived)
            .await
            .map_err(|source| PipelineError::Archive {
                locator: archived.clone(),
                source,
            })?;

        let report = self
            .extract_and_commit(
                &source.key,
                working.path(),
                contents,
                run,
                Some(&archive_bucket),
                Some(archived.key),
            )
            .await?;
        Ok(RunOutcome::Completed(report))
    }

    /// Loads a report from disk straight into the warehouse. Nothing is
    /// archived or exported.
    pub async fn run_local(&self, path: &Path, run: RunContext) -> Result<RunOutcome> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(stage = RunStage::Validating.as_str(), filename = %filename, path = %path.display(), "received local report");
        if !validate_name(&filename) {
            return Ok(abort(RunStage::Validating, PipelineError::Naming(filename)));
        }

        let contents = match tokio::fs::read(path).await {
            Ok(contents) => Bytes::from(contents),
            Err(io_err) => {
                let err = PipelineError::Fetch {
                    locator: ObjectLocator::new("local", path.display().to_string()),
                    source: BucketError::Io(io_err),
                };
                return Ok(abort(RunStage::Fetching, err));
            }
        };

        let report = self
            .extract_and_commit(&filename, path, &contents, run, None, None)
            .await?;
        Ok(RunOutcome::Completed(report))
    }

    async fn extract_and_commit(
        &self,
        object_name: &str,
        workbook_path: &Path,
        contents: &[u8],
        run: RunContext,
        export_bucket: Option<&str>,
        archive_key: Option<String>,
    ) -> Result<RunReport> {
        let metadata = ReportMetadata::derive(object_name, contents)?;
        let filename = metadata.source_filename.as_str();
        info!(
            stage = RunStage::Extracting.as_str(),
            filename = %filename,
            site = %metadata.site,
            report_date = %metadata.report_date,
            hash = %metadata.content_hash,
            "extracting entities"
        );

        let tables = extract_tables(workbook_path.to_path_buf(), metadata.clone(), run).await?;

        let mut committed = Vec::with_capacity(tables.len());
        for table in &tables {
            committed.push(self.commit_table(table, &run, export_bucket).await?);
        }

        info!(stage = RunStage::Done.as_str(), filename = %filename, tables = committed.len(), "report loaded");
        Ok(RunReport {
            filename: metadata.source_filename.clone(),
            site: metadata.site,
            report_date: metadata.report_date,
            content_hash: metadata.content_hash,
            upload_timestamp: run.upload_timestamp,
            archive_key,
            tables: committed,
        })
    }

    async fn commit_table(
        &self,
        table: &ExtractedTable,
        run: &RunContext,
        export_bucket: Option<&str>,
    ) -> Result<CommittedTable> {
        let name = TableName::new(self.config.dataset.clone(), table.entity.table_name());
        let rows = self
            .warehouse
            .append_rows(&name, &table.df)
            .await
            .map_err(|source| {
                error!(stage = RunStage::Committing.as_str(), table = %name, error = %source, "warehouse append failed");
                PipelineError::SinkWrite {
                    table: name.clone(),
                    source,
                }
            })?;
        info!(stage = RunStage::Committing.as_str(), entity = %table.entity, table = %name, rows, "appended rows");

        let (csv_key, snapshot_key) = match export_bucket {
            Some(bucket) => (
                Some(self.export(table, run, bucket, ExportFormat::Csv).await?),
                Some(self.export(table, run, bucket, ExportFormat::Parquet).await?),
            ),
            None => (None, None),
        };

        Ok(CommittedTable {
            entity: table.entity,
            table: name.to_string(),
            rows,
            csv_key,
            snapshot_key,
        })
    }

    async fn export(
        &self,
        table: &ExtractedTable,
        run: &RunContext,
        bucket: &str,
        format: ExportFormat,
    ) -> Result<String> {
        let locator = ObjectLocator::new(
            bucket,
            export_key(run, table.metadata.site, table.entity, format),
        );
        let bytes = format.encode(&table.df)?;
        self.store
            .put_object(&locator, Bytes::from(bytes), format.content_type())
            .await
            .map_err(|source| PipelineError::Export {
                locator: locator.clone(),
                source,
            })?;
        debug!(entity = %table.entity, export = %locator, "wrote export");
        Ok(locator.key)
    }
}

fn abort(stage: RunStage, err: PipelineError) -> RunOutcome {
    warn!(stage = stage.as_str(), reason = %err, "run aborted");
    RunOutcome::Aborted {
        stage,
        reason: err.to_string(),
    }
}

// Every entity is extracted and enriched before the first commit, so a
// malformed workbook writes nothing.
async fn extract_tables(
    path: PathBuf,
    metadata: ReportMetadata,
    run: RunContext,
) -> Result<Vec<ExtractedTable>> {
    task::spawn_blocking(move || -> Result<Vec<ExtractedTable>> {
        let mut workbook = CalamineWorkbook::open(&path)?;
        let frames = extract_all(&mut workbook, metadata.report_date, metadata.site)?;
        frames
            .into_iter()
            .map(|frame| {
                debug!(entity = %frame.entity, rows = frame.df.height(), "extracted entity");
                enrich(frame, &metadata, run.upload_timestamp).map_err(PipelineError::from)
            })
            .collect()
    })
    .await?
}

/// Run-private copy of a fetched report, removed when dropped.
struct WorkingCopy {
    path: PathBuf,
}

impl WorkingCopy {
    async fn write(dir: &Path, filename: &str, contents: &[u8]) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}_{}", Uuid::new_v4(), filename));
        tokio::fs::write(&path, contents).await?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %err, "failed to remove working copy");
        }
    }
}
