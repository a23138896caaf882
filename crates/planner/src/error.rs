use model::records::error_record::RecordField;
use thiserror::Error;

/// Errors raised while rendering error records into an insert statement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// A record has no value for a column declared NOT NULL.
    #[error("record {row} has no value for required column '{column}' ({field})")]
    MissingField {
        row: usize,
        column: String,
        field: RecordField,
    },

    /// A table or column name cannot be quoted.
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("error table schema has no columns")]
    EmptySchema,

    /// Nothing was left to insert.
    #[error("batch has no renderable records")]
    EmptyBatch,
}
