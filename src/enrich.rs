//! Calendar attributes derived from the purchase timestamp.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::info;
use serde::Serialize;

use crate::{
    config::YearWindow,
    data::{Value, parse_timestamp},
    dataset::{CATEGORY, CUSTOMER_ID, ORDER_ID, PRICE, PRODUCT_ID, PURCHASE_TIMESTAMP, Table},
    error::{PipelineError, PipelineResult},
};

/// Calendar fields of one purchase. Only constructible from a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Calendar {
    timestamp: NaiveDateTime,
    year: i32,
    month: u32,
    day: u32,
    weekday: u32,
    hour: u32,
    weekend: bool,
}

impl Calendar {
    pub fn from_timestamp(timestamp: NaiveDateTime) -> Self {
        let weekday = timestamp.weekday().num_days_from_monday();
        Self {
            timestamp,
            year: timestamp.year(),
            month: timestamp.month(),
            day: timestamp.day(),
            weekday,
            hour: timestamp.hour(),
            weekend: weekday >= 5,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1 through 12.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Monday is 0, Sunday is 6.
    pub fn weekday(&self) -> u32 {
        self.weekday
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn is_weekend(&self) -> bool {
        self.weekend
    }
}

/// Column positions the aggregations read on every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyColumns {
    order_id: usize,
    product_id: usize,
    price: usize,
    category: usize,
    customer_id: Option<usize>,
}

/// The joined table plus one [`Calendar`] per row.
#[derive(Debug, Clone)]
pub struct EnrichedTable {
    table: Table,
    calendar: Vec<Calendar>,
    keys: KeyColumns,
}

impl EnrichedTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn calendar(&self, row: usize) -> &Calendar {
        &self.calendar[row]
    }

    pub fn calendars(&self) -> &[Calendar] {
        &self.calendar
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn category(&self, row: usize) -> &str {
        self.table
            .cell(row, self.keys.category)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn price(&self, row: usize) -> Option<f64> {
        self.table.cell(row, self.keys.price).and_then(Value::as_f64)
    }

    pub fn order_id(&self, row: usize) -> Option<&Value> {
        self.table.cell(row, self.keys.order_id)
    }

    pub fn product_id(&self, row: usize) -> Option<&Value> {
        self.table.cell(row, self.keys.product_id)
    }

    pub fn customer_id(&self, row: usize) -> Option<&Value> {
        self.keys
            .customer_id
            .and_then(|idx| self.table.cell(row, idx))
    }

    /// Distinct purchase years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years = self.calendar.iter().map(Calendar::year).collect::<Vec<_>>();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Headers of the joined table followed by the derived calendar columns.
    pub fn export_headers(&self) -> Vec<String> {
        let mut headers = self.table.headers.clone();
        headers.extend(
            ["year", "month", "day", "day_of_week", "hour_of_day", "is_weekend"]
                .iter()
                .map(|s| s.to_string()),
        );
        headers
    }

    pub fn export_row(&self, row: usize) -> Vec<String> {
        let mut cells = self.table.rows[row]
            .iter()
            .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
            .collect::<Vec<_>>();
        let cal = &self.calendar[row];
        cells.push(cal.year().to_string());
        cells.push(cal.month().to_string());
        cells.push(cal.day().to_string());
        cells.push(cal.weekday().to_string());
        cells.push(cal.hour().to_string());
        cells.push(u8::from(cal.is_weekend()).to_string());
        cells
    }
}

fn row_timestamp(cell: Option<&Value>, order_id: Option<&Value>) -> PipelineResult<NaiveDateTime> {
    let fail = |value: String| PipelineError::Timestamp {
        order_id: order_id.map(Value::as_display).unwrap_or_default(),
        value,
    };
    match cell {
        Some(Value::DateTime(dt)) => Ok(*dt),
        Some(Value::Date(d)) => Ok(d.and_time(chrono::NaiveTime::MIN)),
        Some(other) => {
            let raw = other.as_display();
            parse_timestamp(&raw).map_err(|_| fail(raw))
        }
        None => Err(fail(String::new())),
    }
}

/// Derives calendar fields and drops purchases outside `year_window`.
pub fn enrich(joined: Table, year_window: Option<YearWindow>) -> PipelineResult<EnrichedTable> {
    let ts_idx = joined.require_column(PURCHASE_TIMESTAMP)?;
    let keys = KeyColumns {
        order_id: joined.require_column(ORDER_ID)?,
        product_id: joined.require_column(PRODUCT_ID)?,
        price: joined.require_column(PRICE)?,
        category: joined.require_column(CATEGORY)?,
        customer_id: joined.column_index(CUSTOMER_ID),
    };

    let Table {
        name,
        headers,
        types,
        rows,
    } = joined;
    let total = rows.len();
    let mut kept_rows = Vec::with_capacity(total);
    let mut calendar = Vec::with_capacity(total);
    for row in rows {
        let timestamp = row_timestamp(
            row.get(ts_idx).and_then(|c| c.as_ref()),
            row.get(keys.order_id).and_then(|c| c.as_ref()),
        )?;
        let cal = Calendar::from_timestamp(timestamp);
        if year_window.is_some_and(|window| !window.contains(cal.year())) {
            continue;
        }
        kept_rows.push(row);
        calendar.push(cal);
    }
    if let Some(window) = year_window {
        info!(
            "Kept {} of {} row(s) purchased in {}-{}",
            kept_rows.len(),
            total,
            window.start,
            window.end
        );
    }

    let mut table = Table::new(name, headers, types);
    table.rows = kept_rows;
    Ok(EnrichedTable {
        table,
        calendar,
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn calendar_fields_for_a_thursday_afternoon() {
        let cal = Calendar::from_timestamp(ts("2017-06-15 14:30:00"));
        assert_eq!(cal.year(), 2017);
        assert_eq!(cal.month(), 6);
        assert_eq!(cal.day(), 15);
        assert_eq!(cal.weekday(), 3);
        assert_eq!(cal.hour(), 14);
        assert!(!cal.is_weekend());
    }

    #[test]
    fn saturday_and_sunday_are_weekend() {
        assert!(Calendar::from_timestamp(ts("2017-06-17 00:00:00")).is_weekend());
        assert!(Calendar::from_timestamp(ts("2017-06-18 23:59:59")).is_weekend());
        assert!(!Calendar::from_timestamp(ts("2017-06-19 08:00:00")).is_weekend());
    }

    fn joined(rows: &[&[&str]]) -> Table {
        Table::from_raw(
            "joined",
            [
                "order_id",
                "order_purchase_timestamp",
                "product_id",
                "price",
                "product_category_name",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn enrich_applies_year_window() {
        let table = joined(&[
            &["o1", "2015-12-31 10:00:00", "p1", "1.0", "toys"],
            &["o2", "2016-01-01 10:00:00", "p1", "1.0", "toys"],
            &["o3", "2019-01-01 10:00:00", "p1", "1.0", "toys"],
        ]);
        let enriched = enrich(
            table,
            Some(YearWindow {
                start: 2016,
                end: 2018,
            }),
        )
        .unwrap();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched.order_id(0), Some(&Value::String("o2".into())));
        assert_eq!(enriched.calendar(0).year(), 2016);
    }

    #[test]
    fn enrich_rejects_unparseable_timestamps() {
        let table = joined(&[&["o1", "soon", "p1", "1.0", "toys"]]);
        let err = enrich(table, None).unwrap_err();
        assert!(matches!(
            &err,
            PipelineError::Timestamp { order_id, value } if order_id == "o1" && value == "soon"
        ));
        assert!(err.to_string().contains("order 'o1'"));
    }

    #[test]
    fn export_row_appends_calendar_columns() {
        let table = joined(&[&["o1", "2017-06-17 09:05:00", "p1", "2.5", "toys"]]);
        let enriched = enrich(table, None).unwrap();
        let headers = enriched.export_headers();
        assert_eq!(headers.last().map(String::as_str), Some("is_weekend"));
        let row = enriched.export_row(0);
        assert_eq!(&row[5..], &["2017", "6", "17", "5", "9", "1"]);
    }
}
