use thiserror::Error;

use crate::model::Entity;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("sheet '{sheet}' not found in workbook")]
    SheetNotFound { sheet: String },

    #[error("{entity} column {column} at row offset {row_offset}: {message}")]
    TypeCoercion {
        entity: Entity,
        column: &'static str,
        row_offset: usize,
        message: String,
    },

    #[error("filename '{filename}' does not carry a valid report date: {reason}")]
    MalformedDate { filename: String, reason: String },

    #[error("workbook could not be read: {0}")]
    Workbook(String),

    #[error("polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
