//! Column typing for loaded tables.
//!
//! Types are inferred by scanning every non-empty cell of a column; the first
//! candidate that survives all cells wins, in the order boolean, integer,
//! float, date, datetime, falling back to string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    data::{is_placeholder_token, parse_naive_date, parse_naive_datetime},
    error::{PipelineError, PipelineResult},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::Boolean => "Boolean",
            ColumnType::Date => "Date",
            ColumnType::DateTime => "DateTime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TypeCandidate {
    possible_integer: bool,
    possible_float: bool,
    possible_boolean: bool,
    possible_date: bool,
    possible_datetime: bool,
    observed: bool,
}

impl Default for TypeCandidate {
    fn default() -> Self {
        Self {
            possible_integer: true,
            possible_float: true,
            possible_boolean: true,
            possible_date: true,
            possible_datetime: true,
            observed: false,
        }
    }
}

impl TypeCandidate {
    /// Narrows the candidate types; placeholder cells carry no type evidence.
    pub fn observe(&mut self, value: &str) {
        if is_placeholder_token(value) {
            return;
        }
        self.observed = true;
        if self.possible_boolean
            && !matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "t" | "f" | "yes" | "no" | "y" | "n"
            )
        {
            self.possible_boolean = false;
        }
        if self.possible_integer && value.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && value.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_date && parse_naive_date(value).is_err() {
            self.possible_date = false;
        }
        if self.possible_datetime && parse_naive_datetime(value).is_err() {
            self.possible_datetime = false;
        }
    }

    pub fn decide(&self) -> ColumnType {
        if !self.observed {
            // Nothing to go on; an all-empty column stays textual.
            ColumnType::String
        } else if self.possible_boolean {
            ColumnType::Boolean
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else if self.possible_date {
            ColumnType::Date
        } else if self.possible_datetime {
            ColumnType::DateTime
        } else {
            ColumnType::String
        }
    }
}

/// Infers one type per column from decoded rows.
pub fn infer_column_types(column_count: usize, rows: &[Vec<String>]) -> Vec<ColumnType> {
    let mut candidates = vec![TypeCandidate::default(); column_count];
    for row in rows {
        for (candidate, cell) in candidates.iter_mut().zip(row.iter()) {
            candidate.observe(cell.trim());
        }
    }
    candidates.iter().map(TypeCandidate::decide).collect()
}

/// Errors when any of `required` is absent from `headers`.
pub fn require_columns(table: &str, headers: &[String], required: &[&str]) -> PipelineResult<()> {
    for column in required {
        if !headers.iter().any(|header| header == column) {
            return Err(PipelineError::MissingColumn {
                table: table.to_string(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}
