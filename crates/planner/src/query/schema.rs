use crate::error::EncodingError;
use model::records::error_record::RecordField;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Binds one destination column to one field of the error record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub field: RecordField,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn required(name: impl Into<String>, field: RecordField) -> Self {
        Self {
            name: name.into(),
            field,
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>, field: RecordField) -> Self {
        Self {
            name: name.into(),
            field,
            nullable: true,
        }
    }
}

/// Ordered column layout of the error table.
///
/// The layout is fixed for the life of a hub so that every statement it
/// produces targets the same columns in the same order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ErrorTableSchema {
    pub columns: Vec<ColumnSpec>,
}

impl ErrorTableSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn validate(&self) -> Result<(), EncodingError> {
        if self.columns.is_empty() {
            return Err(EncodingError::EmptySchema);
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if col.name.trim().is_empty() {
                return Err(EncodingError::InvalidIdentifier(col.name.clone()));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(EncodingError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

impl Default for ErrorTableSchema {
    /// `(job_id, error_msg)`, both NOT NULL.
    fn default() -> Self {
        Self::new(vec![
            ColumnSpec::required("job_id", RecordField::JobId),
            ColumnSpec::required("error_msg", RecordField::Message),
        ])
    }
}
