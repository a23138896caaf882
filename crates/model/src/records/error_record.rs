use crate::core::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Describes one input row that failed during a load job.
///
/// Records are built once by the producer and never mutated afterwards;
/// the `with_*` helpers consume `self` and hand back the extended record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    /// Identifier of the load job that produced the failure.
    pub job_id: Option<i64>,

    /// Human readable reason the row was rejected.
    pub message: String,

    /// 1-based line number of the row in the input, when known.
    pub line_number: Option<u64>,

    /// The raw input row, as read by the loader.
    pub raw_row: Option<String>,

    /// Loader stage that rejected the row (e.g. "parse", "convert").
    pub stage: Option<String>,

    pub recorded_at: DateTime<Utc>,
}

/// The fields of an [`ErrorRecord`] that can be bound to a destination column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    JobId,
    Message,
    LineNumber,
    RawRow,
    Stage,
    RecordedAt,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            job_id: None,
            message: message.into(),
            line_number: None,
            raw_row: None,
            stage: None,
            recorded_at: Utc::now(),
        }
    }

    /// Shorthand for the common `(job_id, message)` pair.
    pub fn for_job(job_id: i64, message: impl Into<String>) -> Self {
        Self::new(message).with_job(job_id)
    }

    pub fn with_job(mut self, job_id: i64) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn with_line(mut self, line_number: u64) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn with_raw_row(mut self, raw_row: impl Into<String>) -> Self {
        self.raw_row = Some(raw_row.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    /// Returns the value stored under `field`, or [`Value::Null`] when absent.
    pub fn value_of(&self, field: RecordField) -> Value {
        match field {
            RecordField::JobId => self.job_id.into(),
            RecordField::Message => Value::String(self.message.clone()),
            RecordField::LineNumber => self.line_number.into(),
            RecordField::RawRow => self.raw_row.clone().into(),
            RecordField::Stage => self.stage.clone().into(),
            RecordField::RecordedAt => Value::Timestamp(self.recorded_at),
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordField::JobId => "job_id",
            RecordField::Message => "message",
            RecordField::LineNumber => "line_number",
            RecordField::RawRow => "raw_row",
            RecordField::Stage => "stage",
            RecordField::RecordedAt => "recorded_at",
        };
        write!(f, "{name}")
    }
}
