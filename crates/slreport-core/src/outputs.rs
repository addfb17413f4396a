use std::io::Cursor;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::{CsvWriter, DataFrame, PolarsResult, SerWriter};
use slreport_parser::{Entity, Site};

use crate::metadata::RunContext;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const PARQUET_CONTENT_TYPE: &str = "application/vnd.apache.parquet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_CONTENT_TYPE,
            ExportFormat::Parquet => PARQUET_CONTENT_TYPE,
        }
    }

    pub fn encode(&self, df: &DataFrame) -> PolarsResult<Vec<u8>> {
        match self {
            ExportFormat::Csv => create_csv_bytes(df),
            ExportFormat::Parquet => create_parquet_bytes(df),
        }
    }
}

/// `<timestamp>_<original filename>` for the raw archive copy.
pub fn archive_key(run: &RunContext, filename: &str) -> String {
    format!("{}_{}", run.timestamp_prefix(), filename)
}

/// `<timestamp>_<site>_<entity>.<ext>` for a per-entity export.
pub fn export_key(run: &RunContext, site: Site, entity: Entity, format: ExportFormat) -> String {
    format!(
        "{}_{}_{}.{}",
        run.timestamp_prefix(),
        site,
        entity.table_name(),
        format.extension()
    )
}

pub fn create_csv_bytes(df: &DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut clone = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut clone)?;
    Ok(buffer)
}

pub fn create_parquet_bytes(df: &DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut clone = df.clone();
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut clone)?;
    }
    Ok(buffer)
}
