use crate::{
    error::EncodingError,
    query::{
        dialect::MySql,
        encoder::FieldEncoder,
        renderer::{Renderer, push_literal},
        schema::ErrorTableSchema,
    },
};
use model::records::error_record::ErrorRecord;
use serde::{Deserialize, Serialize};

/// What to do with a record that cannot be rendered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncodingPolicy {
    /// One bad record fails the whole batch.
    #[default]
    FailBatch,
    /// Bad records are left out and reported in [`RenderedBatch::skipped`].
    SkipRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the input slice.
    pub index: usize,
    pub error: EncodingError,
}

/// A multi-row insert ready to be executed.
#[derive(Debug, Clone)]
pub struct RenderedBatch {
    pub sql: String,
    pub rows: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Renders batches of error records into `INSERT ... VALUES (...), (...)`.
///
/// Owns the field encoder so its scratch buffer is reused across batches.
#[derive(Debug)]
pub struct BatchBuilder {
    schema: ErrorTableSchema,
    policy: EncodingPolicy,
    encoder: FieldEncoder,
    dialect: MySql,
}

impl BatchBuilder {
    pub fn new(
        schema: ErrorTableSchema,
        policy: EncodingPolicy,
        max_line_size: usize,
    ) -> Result<Self, EncodingError> {
        schema.validate()?;
        Ok(Self {
            schema,
            policy,
            encoder: FieldEncoder::new(max_line_size),
            dialect: MySql,
        })
    }

    /// Builds one statement for `records`, preserving their order.
    pub fn build(
        &mut self,
        table: &str,
        records: &[ErrorRecord],
    ) -> Result<RenderedBatch, EncodingError> {
        if records.is_empty() {
            return Err(EncodingError::EmptyBatch);
        }

        let dialect = self.dialect;
        let per_row = self.schema.columns.len() * (self.encoder.max_line_size() / 4 + 8);
        let mut r = Renderer::with_capacity(&dialect, 64 + per_row * records.len());

        r.sql.push_str("INSERT INTO ");
        r.push_table(table)?;
        r.sql.push_str(" (");
        for (i, col) in self.schema.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.push_identifier(&col.name)?;
        }
        r.sql.push_str(") VALUES ");

        let mut row = String::new();
        let mut rows = 0;
        let mut skipped = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match self.render_row(index, record, &mut row) {
                Ok(()) => {
                    if rows > 0 {
                        r.sql.push_str(", ");
                    }
                    r.sql.push_str(&row);
                    rows += 1;
                }
                Err(error) => match self.policy {
                    EncodingPolicy::FailBatch => return Err(error),
                    EncodingPolicy::SkipRecord => skipped.push(SkippedRecord { index, error }),
                },
            }
        }

        if rows == 0 {
            return Err(EncodingError::EmptyBatch);
        }

        r.sql.push(';');
        Ok(RenderedBatch {
            sql: r.finish(),
            rows,
            skipped,
        })
    }

    // Renders into `row` first so a failing record leaves the statement untouched.
    fn render_row(
        &mut self,
        index: usize,
        record: &ErrorRecord,
        row: &mut String,
    ) -> Result<(), EncodingError> {
        row.clear();
        row.push('(');
        for (i, col) in self.schema.columns.iter().enumerate() {
            let value = record.value_of(col.field);
            if value.is_null() && !col.nullable {
                return Err(EncodingError::MissingField {
                    row: index,
                    column: col.name.clone(),
                    field: col.field,
                });
            }
            if i > 0 {
                row.push_str(", ");
            }
            push_literal(row, &value, &self.dialect, &mut self.encoder);
        }
        row.push(')');
        Ok(())
    }
}
