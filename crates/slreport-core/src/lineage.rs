//! Provenance columns stamped onto every extracted table of a run.

use chrono::{DateTime, Utc};
use polars::prelude::*;
use slreport_parser::{Entity, EntityFrame};

use crate::metadata::ReportMetadata;

pub const UPLOAD_TIMESTAMP_COLUMN: &str = "upload_utc_dt";
pub const FILENAME_COLUMN: &str = "filename";
pub const CONTENT_HASH_COLUMN: &str = "file_contents_hash";

/// An entity's rows after enrichment, together with the run facts they carry.
#[derive(Debug, Clone)]
pub struct ExtractedTable {
    pub entity: Entity,
    pub df: DataFrame,
    pub metadata: ReportMetadata,
    pub upload_timestamp: DateTime<Utc>,
}

impl ExtractedTable {
    pub fn rows(&self) -> usize {
        self.df.height()
    }
}

/// Appends upload time, source filename and content hash to every row.
pub fn enrich(
    frame: EntityFrame,
    metadata: &ReportMetadata,
    upload_timestamp: DateTime<Utc>,
) -> PolarsResult<ExtractedTable> {
    let EntityFrame { entity, df } = frame;

    let df = df
        .lazy()
        .with_columns([
            lit(upload_timestamp.timestamp_micros())
                .cast(DataType::Datetime(
                    TimeUnit::Microseconds,
                    Some(polars::prelude::TimeZone::UTC),
                ))
                .alias(UPLOAD_TIMESTAMP_COLUMN),
            lit(metadata.source_filename.clone()).alias(FILENAME_COLUMN),
            lit(metadata.content_hash.clone()).alias(CONTENT_HASH_COLUMN),
        ])
        .collect()?;

    Ok(ExtractedTable {
        entity,
        df,
        metadata: metadata.clone(),
        upload_timestamp,
    })
}
