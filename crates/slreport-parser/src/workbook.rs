use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};

use crate::errors::ExtractionError;

/// Named-sheet access to a workbook. Extraction only ever needs a whole
/// sheet's used range.
pub trait WorkbookSource {
    fn sheet_range(&mut self, name: &str) -> Result<Range<Data>, ExtractionError>;
}

/// `.xls` / `.xlsx` workbook read through calamine.
pub struct CalamineWorkbook<RS> {
    sheets: Sheets<RS>,
}

impl CalamineWorkbook<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let sheets = open_workbook_auto(path).map_err(|err| {
            ExtractionError::Workbook(format!("failed to open {}: {err}", path.display()))
        })?;
        Ok(Self { sheets })
    }
}

impl CalamineWorkbook<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|err| ExtractionError::Workbook(err.to_string()))?;
        Ok(Self { sheets })
    }
}

impl<RS: Read + Seek> WorkbookSource for CalamineWorkbook<RS> {
    fn sheet_range(&mut self, name: &str) -> Result<Range<Data>, ExtractionError> {
        if !self.sheets.sheet_names().iter().any(|sheet| sheet == name) {
            return Err(ExtractionError::SheetNotFound {
                sheet: name.to_string(),
            });
        }
        self.sheets
            .worksheet_range(name)
            .map_err(|err| ExtractionError::Workbook(format!("sheet '{name}': {err}")))
    }
}

/// Workbook held entirely in memory, keyed by sheet name.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: BTreeMap<String, Range<Data>>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: impl Into<String>, range: Range<Data>) -> Self {
        self.sheets.insert(name.into(), range);
        self
    }

    /// Builds a sheet whose first row is at the origin. Short rows are padded
    /// with empty cells.
    pub fn with_rows(self, name: impl Into<String>, rows: Vec<Vec<Data>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return self.with_sheet(name, Range::empty());
        }

        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width as u32 - 1));
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col_idx, value) in row.into_iter().enumerate() {
                range.set_value((row_idx as u32, col_idx as u32), value);
            }
        }
        self.with_sheet(name, range)
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_range(&mut self, name: &str) -> Result<Range<Data>, ExtractionError> {
        self.sheets
            .get(name)
            .cloned()
            .ok_or_else(|| ExtractionError::SheetNotFound {
                sheet: name.to_string(),
            })
    }
}
