//! Fixed positional schemas for the five report sheets and the extractor
//! that applies them.
//!
//! Field identity comes from column position alone: the sheet's own header
//! row is skipped and never consulted.

mod cells;
mod customer;
mod forecast;
mod master_data;
mod service_group;
mod service_level;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::errors::ExtractionError;
use crate::model::{Entity, EntityFrame, Site};
use crate::workbook::WorkbookSource;

pub use customer::CUSTOMER;
pub use forecast::FORECAST;
pub use master_data::MASTER_DATA;
pub use service_group::SERVICE_GROUP;
pub use service_level::SERVICE_LEVEL;

pub const FILENAME_DATE_COLUMN: &str = "filename_date";
pub const FILENAME_SITE_COLUMN: &str = "filename_site";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Date,
}

/// One positional field: absolute zero-based sheet column, stored name and
/// type. `required` marks the key column whose empty cells drop the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub position: u32,
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnSpec {
    pub const fn text(position: u32, name: &'static str) -> Self {
        Self {
            position,
            name,
            kind: ColumnKind::Text,
            required: false,
        }
    }

    pub const fn number(position: u32, name: &'static str) -> Self {
        Self {
            position,
            name,
            kind: ColumnKind::Number,
            required: false,
        }
    }

    pub const fn date(position: u32, name: &'static str) -> Self {
        Self {
            position,
            name,
            kind: ColumnKind::Date,
            required: false,
        }
    }

    pub const fn key(position: u32, name: &'static str) -> Self {
        Self {
            position,
            name,
            kind: ColumnKind::Text,
            required: true,
        }
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub entity: Entity,
    pub columns: &'static [ColumnSpec],
}

impl EntitySchema {
    pub fn key_column(&self) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|column| column.required)
            .map(|column| column.name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }
}

/// Schemas in extraction order.
pub fn all_schemas() -> [&'static EntitySchema; 5] {
    [
        &MASTER_DATA,
        &SERVICE_LEVEL,
        &SERVICE_GROUP,
        &FORECAST,
        &CUSTOMER,
    ]
}

enum ColumnValues {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
    Date(Vec<Option<i64>>),
}

impl ColumnValues {
    fn new(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Text => ColumnValues::Text(Vec::with_capacity(capacity)),
            ColumnKind::Number => ColumnValues::Number(Vec::with_capacity(capacity)),
            ColumnKind::Date => ColumnValues::Date(Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, cell: Option<&calamine::Data>) -> Result<(), String> {
        match self {
            ColumnValues::Text(values) => values.push(cells::to_text(cell)?),
            ColumnValues::Number(values) => values.push(cells::to_number(cell)?),
            ColumnValues::Date(values) => values.push(
                cells::to_datetime(cell)?.map(|dt| dt.and_utc().timestamp_micros()),
            ),
        }
        Ok(())
    }

    fn into_column(self, name: &str) -> PolarsResult<Column> {
        let column = match self {
            ColumnValues::Text(values) => Column::new(name.into(), values),
            ColumnValues::Number(values) => Column::new(name.into(), values),
            ColumnValues::Date(values) => Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
                .into(),
        };
        Ok(column)
    }
}

/// Reads one entity's sheet into a frame following `schema`, drops rows
/// with an empty key column and stamps the filename date and site.
pub fn extract_entity<W: WorkbookSource + ?Sized>(
    workbook: &mut W,
    schema: &EntitySchema,
    report_date: NaiveDate,
    site: Site,
) -> Result<EntityFrame, ExtractionError> {
    let range = workbook.sheet_range(schema.entity.sheet_name())?;

    // First used row is the header.
    let data_rows = match (range.start(), range.end()) {
        (Some((first, _)), Some((last, _))) if last > first => (first + 1)..=last,
        _ => 1..=0,
    };

    let capacity = data_rows.clone().count();
    let mut values: Vec<ColumnValues> = schema
        .columns
        .iter()
        .map(|column| ColumnValues::new(column.kind, capacity))
        .collect();

    for (row_offset, row) in data_rows.enumerate() {
        for (column, column_values) in schema.columns.iter().zip(values.iter_mut()) {
            let cell = range.get_value((row, column.position));
            column_values
                .push(cell)
                .map_err(|message| ExtractionError::TypeCoercion {
                    entity: schema.entity,
                    column: column.name,
                    row_offset,
                    message,
                })?;
        }
    }

    let columns = schema
        .columns
        .iter()
        .zip(values)
        .map(|(column, column_values)| column_values.into_column(column.name))
        .collect::<PolarsResult<Vec<_>>>()?;
    let mut df = DataFrame::new(columns)?;

    if let Some(key) = schema.key_column() {
        df = df.lazy().filter(col(key).is_not_null()).collect()?;
    }

    attach_filename_metadata(&mut df, report_date, site)?;

    Ok(EntityFrame {
        entity: schema.entity,
        df,
    })
}

/// Extracts every entity in order, stopping at the first failure.
pub fn extract_all<W: WorkbookSource + ?Sized>(
    workbook: &mut W,
    report_date: NaiveDate,
    site: Site,
) -> Result<Vec<EntityFrame>, ExtractionError> {
    all_schemas()
        .into_iter()
        .map(|schema| extract_entity(&mut *workbook, schema, report_date, site))
        .collect()
}

fn attach_filename_metadata(
    df: &mut DataFrame,
    report_date: NaiveDate,
    site: Site,
) -> PolarsResult<()> {
    let height = df.height();
    let date_series = Series::new(FILENAME_DATE_COLUMN.into(), vec![report_date; height]);
    let site_series = Series::new(FILENAME_SITE_COLUMN.into(), vec![site.as_str(); height]);
    df.with_column(date_series)?;
    df.with_column(site_series)?;
    Ok(())
}
