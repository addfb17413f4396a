use std::path::PathBuf;

pub const DEFAULT_DATASET: &str = "hilton";
pub const DEFAULT_ARCHIVE_SUFFIX: &str = "_output";

/// Where raw copies and per-entity exports are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveTarget {
    /// Appended to the bucket the report arrived in.
    Suffix(String),
    /// A fixed bucket regardless of the source.
    Bucket(String),
}

impl ArchiveTarget {
    pub fn bucket_for(&self, source_bucket: &str) -> String {
        match self {
            ArchiveTarget::Suffix(suffix) => format!("{source_bucket}{suffix}"),
            ArchiveTarget::Bucket(bucket) => bucket.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Warehouse namespace the five tables live under.
    pub dataset: String,
    pub archive: ArchiveTarget,
    /// Directory holding per-run working copies of fetched reports.
    pub work_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            archive: ArchiveTarget::Suffix(DEFAULT_ARCHIVE_SUFFIX.to_string()),
            work_dir: std::env::temp_dir(),
        }
    }
}

impl PipelineConfig {
    pub fn archive_bucket(&self, source_bucket: &str) -> String {
        self.archive.bucket_for(source_bucket)
    }
}
