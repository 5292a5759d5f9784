//! Mean/mode imputation of missing cells.
//!
//! Numeric columns are filled with their arithmetic mean; every other column
//! with its most frequent value, the smallest value winning a tie. Columns
//! are treated independently and a column with no observed value is left
//! as-is.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;

use crate::{data::Value, dataset::Table, schema::ColumnType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fill {
    Mean(f64),
    Mode(Value),
    /// Every cell was missing; nothing to derive a substitute from.
    Unfillable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFill {
    pub column: String,
    pub missing: usize,
    pub fill: Fill,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImputationReport {
    pub table: String,
    pub columns: Vec<ColumnFill>,
}

impl ImputationReport {
    pub fn filled_cells(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| !matches!(c.fill, Fill::Unfillable))
            .map(|c| c.missing)
            .sum()
    }
}

pub fn column_mean(table: &Table, column: usize) -> Option<f64> {
    let (sum, count) = table
        .rows
        .iter()
        .filter_map(|row| row.get(column).and_then(|c| c.as_ref()))
        .filter_map(Value::as_f64)
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn column_mode(table: &Table, column: usize) -> Option<Value> {
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for value in table
        .rows
        .iter()
        .filter_map(|row| row.get(column).and_then(|c| c.as_ref()))
    {
        *counts.entry(value).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending, so keeping only strictly larger counts
    // leaves the smallest value among the most frequent.
    let mut best: Option<(&Value, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.clone())
}

/// Fills missing cells in place and reports what was substituted.
pub fn impute_table(table: &mut Table) -> ImputationReport {
    let mut report = ImputationReport {
        table: table.name.clone(),
        columns: Vec::new(),
    };
    for column in 0..table.headers.len() {
        let missing = table.missing_count(column);
        if missing == 0 {
            continue;
        }
        let column_type = table.types[column];
        let fill = if column_type.is_numeric() {
            column_mean(table, column).map_or(Fill::Unfillable, Fill::Mean)
        } else {
            column_mode(table, column).map_or(Fill::Unfillable, Fill::Mode)
        };
        match &fill {
            Fill::Mean(mean) => {
                if column_type == ColumnType::Integer {
                    promote_to_float(table, column);
                }
                fill_missing(table, column, &Value::Float(*mean));
            }
            Fill::Mode(mode) => fill_missing(table, column, mode),
            Fill::Unfillable => warn!(
                "Column '{}' in '{}' has no values; leaving {} cell(s) empty",
                table.headers[column], table.name, missing
            ),
        }
        debug!(
            "Imputed {} cell(s) in '{}.{}' with {:?}",
            missing, table.name, table.headers[column], fill
        );
        report.columns.push(ColumnFill {
            column: table.headers[column].clone(),
            missing,
            fill,
        });
    }
    report
}

fn fill_missing(table: &mut Table, column: usize, value: &Value) {
    for row in &mut table.rows {
        if let Some(cell) = row.get_mut(column)
            && cell.is_none()
        {
            *cell = Some(value.clone());
        }
    }
}

fn promote_to_float(table: &mut Table, column: usize) {
    table.types[column] = ColumnType::Float;
    for row in &mut table.rows {
        if let Some(Some(Value::Integer(i))) = row.get(column) {
            let promoted = *i as f64;
            row[column] = Some(Value::Float(promoted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_raw(
            "t",
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn numeric_columns_take_the_mean() {
        let mut t = table(&["price"], &[&["10"], &[""], &["20"]]);
        let report = impute_table(&mut t);
        assert_eq!(t.types[0], ColumnType::Float);
        assert_eq!(t.cell(1, 0), Some(&Value::Float(15.0)));
        assert_eq!(t.cell(0, 0), Some(&Value::Float(10.0)));
        assert_eq!(report.filled_cells(), 1);
    }

    #[test]
    fn placeholder_cells_are_imputed_like_blanks() {
        let mut t = table(&["price"], &[&["10.00"], &["NA"], &["20.00"], &["NaN"], &[""]]);
        assert_eq!(t.types[0], ColumnType::Float);
        let report = impute_table(&mut t);
        assert_eq!(report.columns[0].fill, Fill::Mean(15.0));
        assert_eq!(report.filled_cells(), 3);
        for row in [1, 3, 4] {
            assert_eq!(t.cell(row, 0), Some(&Value::Float(15.0)));
        }
    }

    #[test]
    fn non_finite_values_stay_out_of_the_mean() {
        let mut t = table(&["weight"], &[&["1.5"], &["inf"], &["2.5"], &[""]]);
        impute_table(&mut t);
        assert_eq!(t.cell(3, 0), Some(&Value::Float(2.0)));
    }

    #[test]
    fn text_columns_take_the_smallest_mode() {
        let mut t = table(
            &["status"],
            &[&["shipped"], &["delivered"], &[""], &["shipped"], &["delivered"]],
        );
        impute_table(&mut t);
        assert_eq!(t.cell(2, 0), Some(&Value::String("delivered".into())));
    }

    #[test]
    fn fully_missing_columns_are_left_alone() {
        let mut t = table(&["id", "note"], &[&["a", ""], &["b", ""]]);
        let report = impute_table(&mut t);
        assert_eq!(t.missing_count(1), 2);
        assert_eq!(report.columns[0].fill, Fill::Unfillable);
        assert_eq!(report.filled_cells(), 0);
    }

    #[test]
    fn complete_columns_are_not_reported() {
        let mut t = table(&["id"], &[&["a"], &["b"]]);
        assert!(impute_table(&mut t).columns.is_empty());
    }
}
