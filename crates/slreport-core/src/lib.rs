pub mod config;
pub mod db;
pub mod error;
pub mod lineage;
pub mod metadata;
pub mod outputs;
pub mod pipeline;
pub mod warehouse;

pub use config::{ArchiveTarget, PipelineConfig};
pub use error::{PipelineError, Result};
pub use lineage::{enrich, ExtractedTable};
pub use metadata::{compute_hash, ArtifactReference, ReportMetadata, RunContext, StorageEvent};
pub use pipeline::{CommittedTable, ReportPipeline, RunOutcome, RunReport, RunStage};
pub use warehouse::{MemoryWarehouse, PostgresWarehouse, TableName, WarehouseError, WarehouseSink};
