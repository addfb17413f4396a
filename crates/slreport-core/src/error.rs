// crates/slreport-core/src/error.rs

use slreport_bucket::{BucketError, ObjectLocator};
use slreport_parser::ExtractionError;
use thiserror::Error;

use crate::warehouse::{TableName, WarehouseError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("'{0}' is not a service level report")]
    Naming(String),

    #[error("failed to fetch {locator}: {source}")]
    Fetch {
        locator: ObjectLocator,
        #[source]
        source: BucketError,
    },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("failed to archive raw copy to {locator}: {source}")]
    Archive {
        locator: ObjectLocator,
        #[source]
        source: BucketError,
    },

    #[error("failed to append to {table}: {source}")]
    SinkWrite {
        table: TableName,
        #[source]
        source: WarehouseError,
    },

    #[error("failed to write export {locator}: {source}")]
    Export {
        locator: ObjectLocator,
        #[source]
        source: BucketError,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
