pub mod entities;
pub mod errors;
pub mod filename;
pub mod model;
pub mod workbook;

pub use entities::{all_schemas, extract_all, extract_entity, ColumnKind, ColumnSpec, EntitySchema};
pub use errors::ExtractionError;
pub use filename::{extract_date, infer_site, validate_name};
pub use model::{Entity, EntityFrame, Site};
pub use workbook::{CalamineWorkbook, MemoryWorkbook, WorkbookSource};
