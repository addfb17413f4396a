use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use slreport_bucket::{BucketStore, LocalBucketStore, S3BucketStore, S3Config};
use slreport_core::{db, ArchiveTarget, MemoryWarehouse, PipelineConfig, PostgresWarehouse, WarehouseSink};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    S3,
    Local,
}

/// Storage, warehouse and archive settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Object storage backend
    #[arg(long, env = "SLREPORT_STORAGE", value_enum, default_value = "s3", global = true)]
    pub storage: StorageKind,

    /// Root directory of the local backend; each bucket is a subdirectory
    #[arg(long, env = "SLREPORT_LOCAL_ROOT", global = true)]
    pub local_root: Option<PathBuf>,

    #[arg(long, env = "SLREPORT_S3_REGION", default_value = "us-east-1", global = true)]
    pub s3_region: String,

    #[arg(long, env = "SLREPORT_S3_ENDPOINT", global = true)]
    pub s3_endpoint: Option<String>,

    #[arg(long, env = "SLREPORT_S3_ACCESS_KEY_ID", global = true)]
    pub s3_access_key_id: Option<String>,

    #[arg(long, env = "SLREPORT_S3_SECRET_ACCESS_KEY", hide_env_values = true, global = true)]
    pub s3_secret_access_key: Option<String>,

    #[arg(long, env = "SLREPORT_S3_FORCE_PATH_STYLE", global = true)]
    pub s3_force_path_style: bool,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,

    /// Warehouse dataset (Postgres schema) holding the report tables
    #[arg(long, env = "SLREPORT_DATASET", default_value = slreport_core::config::DEFAULT_DATASET, global = true)]
    pub dataset: String,

    /// Keep appended rows in memory instead of writing to Postgres
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Fixed archive bucket; overrides the suffix
    #[arg(long, env = "SLREPORT_ARCHIVE_BUCKET", global = true)]
    pub archive_bucket: Option<String>,

    /// Appended to the source bucket to name the archive bucket
    #[arg(long, env = "SLREPORT_ARCHIVE_SUFFIX", default_value = slreport_core::config::DEFAULT_ARCHIVE_SUFFIX, global = true)]
    pub archive_suffix: String,

    /// Directory for per-run working copies
    #[arg(long, env = "SLREPORT_WORK_DIR", global = true)]
    pub work_dir: Option<PathBuf>,
}

impl Settings {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let archive = match &self.archive_bucket {
            Some(bucket) => ArchiveTarget::Bucket(bucket.clone()),
            None => ArchiveTarget::Suffix(self.archive_suffix.clone()),
        };
        PipelineConfig {
            dataset: self.dataset.clone(),
            archive,
            work_dir: self
                .work_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
        }
    }

    pub async fn bucket_store(&self) -> Result<Arc<dyn BucketStore>> {
        match self.storage {
            StorageKind::Local => {
                let Some(root) = &self.local_root else {
                    bail!("SLREPORT_LOCAL_ROOT must be set for local storage");
                };
                info!(root = %root.display(), "using local bucket store");
                Ok(Arc::new(LocalBucketStore::new(root.clone())))
            }
            StorageKind::S3 => {
                let store = S3BucketStore::new(S3Config {
                    region: self.s3_region.clone(),
                    endpoint: self.s3_endpoint.clone(),
                    access_key_id: self.s3_access_key_id.clone(),
                    secret_access_key: self.s3_secret_access_key.clone(),
                    force_path_style: self.s3_force_path_style,
                })
                .await
                .context("failed to configure S3 bucket store")?;
                info!(region = %self.s3_region, "using S3 bucket store");
                Ok(Arc::new(store))
            }
        }
    }

    pub async fn warehouse(&self) -> Result<Arc<dyn WarehouseSink>> {
        if self.dry_run {
            info!("dry run: appends are kept in memory");
            return Ok(Arc::new(MemoryWarehouse::new()));
        }
        let pool = self.connect_pool().await?;
        Ok(Arc::new(PostgresWarehouse::new(pool)))
    }

    pub async fn connect_pool(&self) -> Result<db::DbPool> {
        let database_url = self
            .database_url
            .clone()
            .or_else(|| std::env::var("SLREPORT_DATABASE_URL").ok())
            .context("DATABASE_URL (or SLREPORT_DATABASE_URL) must be set")?;
        db::connect(&database_url)
            .await
            .context("failed to connect to Postgres")
    }
}
