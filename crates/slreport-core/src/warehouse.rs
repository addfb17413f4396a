//! Append-only sinks for the five report tables.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;
use tracing::debug;

use crate::db::DbPool;

// Postgres caps a statement at 65535 bind parameters.
const MAX_BIND_PARAMETERS: usize = 65_535;

/// `<dataset>.<table>`; the dataset maps to a Postgres schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName {
    pub dataset: String,
    pub table: String,
}

impl TableName {
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.dataset), quote_ident(&self.table))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("column '{column}' has unsupported type {dtype}")]
    UnsupportedColumn { column: String, dtype: String },
    #[error("append rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait WarehouseSink: Send + Sync {
    /// Appends every row of `df` to `table` and returns the number written.
    async fn append_rows(&self, table: &TableName, df: &DataFrame) -> Result<u64, WarehouseError>;
}

/// Keeps appended frames in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    appends: Mutex<Vec<(TableName, DataFrame)>>,
    failing_table: Option<String>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects appends to the named table.
    pub fn failing_on(table: impl Into<String>) -> Self {
        Self {
            appends: Mutex::default(),
            failing_table: Some(table.into()),
        }
    }

    /// Appended frames in commit order.
    pub fn appends(&self) -> Vec<(TableName, DataFrame)> {
        self.appends
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.appends()
            .iter()
            .filter(|(name, _)| name.table == table)
            .map(|(_, df)| df.height())
            .sum()
    }
}

#[async_trait]
impl WarehouseSink for MemoryWarehouse {
    async fn append_rows(&self, table: &TableName, df: &DataFrame) -> Result<u64, WarehouseError> {
        if self.failing_table.as_deref() == Some(table.table.as_str()) {
            return Err(WarehouseError::Rejected(format!("{table} is not writable")));
        }
        self.appends
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((table.clone(), df.clone()));
        Ok(df.height() as u64)
    }
}

/// Appends through multi-row `INSERT`s, one transaction per table.
#[derive(Debug, Clone)]
pub struct PostgresWarehouse {
    pool: DbPool,
    batch_rows: usize,
}

impl PostgresWarehouse {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            batch_rows: 1_000,
        }
    }

    pub fn with_batch_rows(mut self, batch_rows: usize) -> Self {
        self.batch_rows = batch_rows.max(1);
        self
    }
}

#[async_trait]
impl WarehouseSink for PostgresWarehouse {
    async fn append_rows(&self, table: &TableName, df: &DataFrame) -> Result<u64, WarehouseError> {
        if df.height() == 0 || df.width() == 0 {
            return Ok(0);
        }

        let columns = df
            .get_columns()
            .iter()
            .map(|column| BindColumn::from_series(column.as_materialized_series()))
            .collect::<Result<Vec<_>, _>>()?;
        let column_list = df
            .get_column_names()
            .iter()
            .map(|name| quote_ident(name.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let chunk_rows = self.batch_rows.min(MAX_BIND_PARAMETERS / columns.len()).max(1);
        let height = df.height();

        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        let mut start = 0;
        while start < height {
            let end = (start + chunk_rows).min(height);
            let mut builder = QueryBuilder::<Postgres>::new(format!(
                "INSERT INTO {} ({}) ",
                table.quoted(),
                column_list
            ));
            builder.push_values(start..end, |mut row, index| {
                for column in &columns {
                    column.bind(&mut row, index);
                }
            });
            let result = builder.build().execute(&mut *tx).await?;
            written += result.rows_affected();
            debug!(table = %table, rows = end - start, "inserted chunk");
            start = end;
        }
        tx.commit().await?;

        Ok(written)
    }
}

enum BindColumn {
    Text(Vec<Option<String>>),
    Float(Vec<Option<f64>>),
    TimestampTz(Vec<Option<DateTime<Utc>>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
    Date(Vec<Option<NaiveDate>>),
}

impl BindColumn {
    fn from_series(series: &Series) -> Result<Self, WarehouseError> {
        let column = match series.dtype() {
            DataType::String => BindColumn::Text(
                series
                    .str()?
                    .into_iter()
                    .map(|value| value.map(str::to_owned))
                    .collect(),
            ),
            DataType::Float64 => BindColumn::Float(series.f64()?.into_iter().collect()),
            DataType::Datetime(_, tz) => {
                let micros = series
                    .cast(&DataType::Datetime(TimeUnit::Microseconds, tz.clone()))?
                    .cast(&DataType::Int64)?;
                let values = micros
                    .i64()?
                    .into_iter()
                    .map(|value| value.and_then(DateTime::<Utc>::from_timestamp_micros));
                if tz.is_some() {
                    BindColumn::TimestampTz(values.collect())
                } else {
                    BindColumn::Timestamp(values.map(|value| value.map(|dt| dt.naive_utc())).collect())
                }
            }
            DataType::Date => BindColumn::Date(series.date()?.as_date_iter().collect()),
            other => {
                return Err(WarehouseError::UnsupportedColumn {
                    column: series.name().to_string(),
                    dtype: other.to_string(),
                })
            }
        };
        Ok(column)
    }

    fn bind(&self, row: &mut sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>, index: usize) {
        match self {
            BindColumn::Text(values) => {
                row.push_bind(values[index].clone());
            }
            BindColumn::Float(values) => {
                row.push_bind(values[index]);
            }
            BindColumn::TimestampTz(values) => {
                row.push_bind(values[index]);
            }
            BindColumn::Timestamp(values) => {
                row.push_bind(values[index]);
            }
            BindColumn::Date(values) => {
                row.push_bind(values[index]);
            }
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
