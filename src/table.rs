//! Plain-text rendering of aggregate tables.
//!
//! Columns whose every body cell is numeric are right-aligned. Count columns
//! can carry a proportional bar so a terminal reader gets the shape of a
//! chart without one.

use std::borrow::Cow;
use std::fmt::Write as _;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    let mut aligns = vec![Align::Right; column_count];

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
            if !looks_numeric(cell) {
                aligns[idx] = Align::Left;
            }
        }
    }
    if rows.is_empty() {
        aligns.fill(Align::Left);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &aligns));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(
        output,
        "{}",
        format_row(&separator, &widths, &vec![Align::Left; column_count])
    );
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &aligns));
    }
    output
}

/// Appends a bar column scaled against the largest value in `values`.
pub fn with_bars(rows: &mut [Vec<String>], values: &[f64]) {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    for (row, value) in rows.iter_mut().zip(values) {
        let width = if max > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        row.push("#".repeat(width));
    }
}

pub fn print_table(title: &str, headers: &[String], rows: &[Vec<String>]) {
    println!("{title}");
    print!("{}", render_table(headers, rows));
    println!();
}

fn looks_numeric(value: &str) -> bool {
    !value.is_empty() && value.trim().parse::<f64>().is_ok()
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate().take(widths.len()) {
        let sanitized = sanitize_cell(value);
        let padding = " ".repeat(widths[idx].saturating_sub(display_width(&sanitized)));
        let cell = match aligns.get(idx) {
            Some(Align::Right) => format!("{padding}{sanitized}"),
            _ => format!("{sanitized}{padding}"),
        };
        cells.push(cell);
    }
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
