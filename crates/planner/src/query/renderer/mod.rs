//! Accumulates statement text for the error-row inserts.

use crate::{
    error::EncodingError,
    query::{dialect::MySql, encoder::FieldEncoder},
};
use model::core::value::Value;

pub mod insert;

/// Holds the SQL being built and the dialect used to spell it.
pub struct Renderer<'a> {
    pub sql: String,
    pub dialect: &'a MySql,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a MySql) -> Self {
        Self {
            sql: String::new(),
            dialect,
        }
    }

    pub fn with_capacity(dialect: &'a MySql, capacity: usize) -> Self {
        Self {
            sql: String::with_capacity(capacity),
            dialect,
        }
    }

    pub fn push_table(&mut self, table: &str) -> Result<(), EncodingError> {
        let quoted = self.dialect.quote_table(table)?;
        self.sql.push_str(&quoted);
        Ok(())
    }

    pub fn push_identifier(&mut self, ident: &str) -> Result<(), EncodingError> {
        let quoted = self.dialect.quote_identifier(ident)?;
        self.sql.push_str(&quoted);
        Ok(())
    }

    pub fn finish(self) -> String {
        self.sql
    }
}

/// Appends `value` to `out` as an inline SQL literal.
///
/// Strings go through `encoder`, which applies the per-field length cap.
pub fn push_literal(out: &mut String, value: &Value, dialect: &MySql, encoder: &mut FieldEncoder) {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Int(v) => out.push_str(&v.to_string()),
        Value::Uint(v) => out.push_str(&v.to_string()),
        Value::String(s) => {
            out.push('\'');
            out.push_str(encoder.encode(s));
            out.push('\'');
        }
        Value::Timestamp(ts) => {
            out.push('\'');
            out.push_str(&dialect.format_timestamp(ts));
            out.push('\'');
        }
    }
}
