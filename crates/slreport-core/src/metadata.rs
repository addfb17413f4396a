use blake3::Hasher;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use slreport_bucket::ObjectLocator;
use slreport_parser::{extract_date, infer_site, ExtractionError, Site};

/// Prefix format shared by the raw archive copy and every export of a run.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H:%M:%S";

/// Object-finalised notification as delivered by the storage trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub name: String,
    pub bucket: String,
}

/// The inbound report: where it lives and, once fetched, its bytes.
#[derive(Debug, Clone)]
pub struct ArtifactReference {
    pub locator: ObjectLocator,
    pub contents: Option<Bytes>,
}

impl ArtifactReference {
    pub fn new(locator: ObjectLocator) -> Self {
        Self {
            locator,
            contents: None,
        }
    }

    /// Final path segment of the object key.
    pub fn filename(&self) -> &str {
        final_segment(&self.locator.key)
    }
}

impl From<StorageEvent> for ArtifactReference {
    fn from(event: StorageEvent) -> Self {
        Self::new(ObjectLocator::new(event.bucket, event.name))
    }
}

fn final_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Run-wide facts derived once from the object name and the raw bytes.
///
/// Date and site are read from the whole object name, so a folder such as
/// `trug/` still marks the site. `source_filename` is the final segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMetadata {
    pub report_date: NaiveDate,
    pub site: Site,
    pub source_filename: String,
    pub content_hash: String,
}

impl ReportMetadata {
    pub fn derive(object_name: &str, contents: &[u8]) -> Result<Self, ExtractionError> {
        Ok(Self {
            report_date: extract_date(object_name)?,
            site: infer_site(object_name),
            source_filename: final_segment(object_name).to_string(),
            content_hash: compute_hash(contents),
        })
    }
}

pub fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}

/// Clock reading captured once when a run starts and handed to every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub upload_timestamp: DateTime<Utc>,
}

impl RunContext {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(upload_timestamp: DateTime<Utc>) -> Self {
        Self { upload_timestamp }
    }

    pub fn timestamp_prefix(&self) -> String {
        self.upload_timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}
