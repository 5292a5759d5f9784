//! Grouped counts, sums, and summary scalars over a filtered view.
//!
//! Every grid is dense: each key in the group's domain appears, with zero
//! when no row falls in it, so a grid's counts always add up to the number
//! of rows in the view.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::warn;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::Serialize;

use crate::{
    config::{TieBreak, WeekdayLocale},
    enrich::Calendar,
    error::{PipelineError, PipelineResult},
    filter::{FilteredView, weekday_name},
};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum GroupKey {
    Weekday,
    Weekend,
    Hour,
    Month,
    Year,
}

impl GroupKey {
    pub fn title(&self) -> &'static str {
        match self {
            GroupKey::Weekday => "day_of_week",
            GroupKey::Weekend => "day_type",
            GroupKey::Hour => "hour_of_day",
            GroupKey::Month => "month",
            GroupKey::Year => "year",
        }
    }

    /// Every key value the grid spans. Years come from the unfiltered base.
    fn domain(&self, view: &FilteredView<'_>) -> Vec<i64> {
        match self {
            GroupKey::Weekday => (0..7).collect(),
            GroupKey::Weekend => (0..2).collect(),
            GroupKey::Hour => (0..24).collect(),
            GroupKey::Month => (1..=12).collect(),
            GroupKey::Year => {
                let years = view.base().years();
                match (years.first(), years.last()) {
                    (Some(first), Some(last)) => (i64::from(*first)..=i64::from(*last)).collect(),
                    _ => Vec::new(),
                }
            }
        }
    }

    fn key_of(&self, calendar: &Calendar) -> i64 {
        match self {
            GroupKey::Weekday => i64::from(calendar.weekday()),
            GroupKey::Weekend => i64::from(calendar.is_weekend()),
            GroupKey::Hour => i64::from(calendar.hour()),
            GroupKey::Month => i64::from(calendar.month()),
            GroupKey::Year => i64::from(calendar.year()),
        }
    }

    pub fn label(&self, key: i64, locale: WeekdayLocale) -> String {
        match self {
            GroupKey::Weekday => weekday_name(key as u32, locale).to_string(),
            GroupKey::Weekend => match (key, locale) {
                (0, WeekdayLocale::En) => "Weekday".into(),
                (_, WeekdayLocale::En) => "Weekend".into(),
                (0, WeekdayLocale::Id) => "Hari kerja".into(),
                (_, WeekdayLocale::Id) => "Akhir pekan".into(),
            },
            GroupKey::Hour => format!("{key:02}"),
            GroupKey::Month => MONTH_LABELS
                .get((key - 1) as usize)
                .map(|s| s.to_string())
                .unwrap_or_else(|| key.to_string()),
            GroupKey::Year => key.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Value counts of the category label, largest first, cut to `top_k` (0 = all).
pub fn category_counts(
    view: &FilteredView<'_>,
    top_k: usize,
    tie_break: TieBreak,
) -> Vec<CategoryCount> {
    let base = view.base();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &row in view.rows() {
        let label = base.category(row);
        let next = first_seen.len();
        first_seen.entry(label).or_insert(next);
        *counts.entry(label).or_insert(0) += 1;
    }
    let ordered = counts.into_iter().sorted_by(|a, b| {
        b.1.cmp(&a.1).then_with(|| match tie_break {
            TieBreak::NameAscending => a.0.cmp(b.0),
            TieBreak::FirstSeen => first_seen[a.0].cmp(&first_seen[b.0]),
        })
    });
    let limit = if top_k == 0 { usize::MAX } else { top_k };
    ordered
        .take(limit)
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell<T> {
    pub key: i64,
    pub label: String,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid1<T> {
    pub key: GroupKey,
    pub cells: Vec<GridCell<T>>,
}

impl Grid1<usize> {
    pub fn total(&self) -> usize {
        self.cells.iter().map(|c| c.value).sum()
    }
}

pub fn count_by(view: &FilteredView<'_>, key: GroupKey, locale: WeekdayLocale) -> Grid1<usize> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &row in view.rows() {
        *counts.entry(key.key_of(view.base().calendar(row))).or_insert(0) += 1;
    }
    let cells = key
        .domain(view)
        .into_iter()
        .map(|k| GridCell {
            key: k,
            label: key.label(k, locale),
            value: counts.get(&k).copied().unwrap_or(0),
        })
        .collect();
    Grid1 { key, cells }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Measure {
    Price,
}

/// Dense grouped sums of `measure`, rounded to cents.
pub fn sum_by(
    view: &FilteredView<'_>,
    key: GroupKey,
    measure: Measure,
    locale: WeekdayLocale,
) -> PipelineResult<Grid1<Decimal>> {
    let mut sums: HashMap<i64, Decimal> = HashMap::new();
    for &row in view.rows() {
        let amount = match measure {
            Measure::Price => view.base().price(row).and_then(to_money),
        };
        let Some(amount) = amount else {
            continue;
        };
        let group = key.key_of(view.base().calendar(row));
        let total = sums.entry(group).or_insert(Decimal::ZERO);
        *total = add_money(*total, amount, key.title())?;
    }
    let cells = key
        .domain(view)
        .into_iter()
        .map(|k| GridCell {
            key: k,
            label: key.label(k, locale),
            value: to_cents(sums.get(&k).copied().unwrap_or(Decimal::ZERO)),
        })
        .collect();
    Ok(Grid1 { key, cells })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid2 {
    pub rows_key: GroupKey,
    pub columns_key: GroupKey,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl Grid2 {
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Two-key count grid (e.g. weekday × hour), zero-filled.
pub fn count_by_pair(
    view: &FilteredView<'_>,
    rows_key: GroupKey,
    columns_key: GroupKey,
    locale: WeekdayLocale,
) -> Grid2 {
    let row_domain = rows_key.domain(view);
    let column_domain = columns_key.domain(view);
    let row_pos: HashMap<i64, usize> = row_domain.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let column_pos: HashMap<i64, usize> = column_domain
        .iter()
        .enumerate()
        .map(|(i, k)| (*k, i))
        .collect();
    let mut counts = vec![vec![0usize; column_domain.len()]; row_domain.len()];
    for &row in view.rows() {
        let calendar = view.base().calendar(row);
        if let (Some(r), Some(c)) = (
            row_pos.get(&rows_key.key_of(calendar)),
            column_pos.get(&columns_key.key_of(calendar)),
        ) {
            counts[*r][*c] += 1;
        }
    }
    Grid2 {
        rows_key,
        columns_key,
        row_labels: row_domain.iter().map(|k| rows_key.label(*k, locale)).collect(),
        column_labels: column_domain
            .iter()
            .map(|k| columns_key.label(*k, locale))
            .collect(),
        counts,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub item_rows: usize,
    pub distinct_orders: usize,
    pub distinct_products: usize,
    pub distinct_customers: usize,
    pub mean_price: Option<Decimal>,
    pub total_revenue: Decimal,
}

pub fn summary(view: &FilteredView<'_>) -> PipelineResult<Summary> {
    let base = view.base();
    let mut orders = HashSet::new();
    let mut products = HashSet::new();
    let mut customers = HashSet::new();
    let mut revenue = Decimal::ZERO;
    let mut priced = 0usize;
    for &row in view.rows() {
        if let Some(id) = base.order_id(row) {
            orders.insert(id.as_display());
        }
        if let Some(id) = base.product_id(row) {
            products.insert(id.as_display());
        }
        if let Some(id) = base.customer_id(row) {
            customers.insert(id.as_display());
        }
        if let Some(price) = base.price(row).and_then(to_money) {
            revenue = add_money(revenue, price, "total revenue")?;
            priced += 1;
        }
    }
    let mean_price = (priced > 0).then(|| to_cents(revenue / Decimal::from(priced)));
    Ok(Summary {
        item_rows: view.len(),
        distinct_orders: orders.len(),
        distinct_products: products.len(),
        distinct_customers: customers.len(),
        mean_price,
        total_revenue: to_cents(revenue),
    })
}

/// Converts a price; values outside `Decimal`'s range are skipped with a warning.
fn to_money(value: f64) -> Option<Decimal> {
    let money = Decimal::from_f64(value);
    if money.is_none() {
        warn!("Price {value} cannot be represented as a decimal; leaving it out of sums");
    }
    money
}

fn add_money(total: Decimal, amount: Decimal, what: &str) -> PipelineResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| PipelineError::Overflow(what.to_string()))
}

/// Rounds to two decimal places and always displays both.
fn to_cents(value: Decimal) -> Decimal {
    let mut cents = value.round_dp(2);
    cents.rescale(2);
    cents
}

pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::Table, enrich, filter::FilteredView};

    fn base(rows: &[(&str, &str, &str, &str)]) -> enrich::EnrichedTable {
        let table = Table::from_raw(
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
                .map(|(order, ts, price, category)| {
                    vec![
                        order.to_string(),
                        ts.to_string(),
                        format!("p-{category}"),
                        price.to_string(),
                        category.to_string(),
                    ]
                })
                .collect(),
        )
        .unwrap();
        enrich::enrich(table, None).unwrap()
    }

    fn categories(spec: &[(&str, usize)]) -> enrich::EnrichedTable {
        let mut rows = Vec::new();
        for (category, count) in spec {
            for _ in 0..*count {
                rows.push(("o", "2017-06-15 14:30:00", "1.0", *category));
            }
        }
        base(&rows)
    }

    #[test]
    fn top_k_breaks_ties_by_name() {
        let table = categories(&[("D", 10), ("C", 30), ("B", 30), ("A", 50)]);
        let view = FilteredView::all(&table);
        let top = category_counts(&view, 3, TieBreak::NameAscending);
        let names: Vec<&str> = top.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(top[0].count, 50);
    }

    #[test]
    fn top_k_can_break_ties_by_first_appearance() {
        let table = categories(&[("C", 30), ("B", 30), ("A", 50)]);
        let view = FilteredView::all(&table);
        let top = category_counts(&view, 0, TieBreak::FirstSeen);
        let names: Vec<&str> = top.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
    }

    #[test]
    fn grids_are_dense_and_conserve_counts() {
        let table = base(&[
            ("o1", "2017-06-15 14:30:00", "10.00", "toys"),
            ("o2", "2017-06-17 09:00:00", "5.50", "toys"),
            ("o3", "2018-01-01 23:10:00", "2.25", "auto"),
        ]);
        let view = FilteredView::all(&table);
        let hours = count_by(&view, GroupKey::Hour, WeekdayLocale::En);
        assert_eq!(hours.cells.len(), 24);
        assert_eq!(hours.total(), 3);
        assert_eq!(hours.cells[14].value, 1);

        let weekend = count_by(&view, GroupKey::Weekend, WeekdayLocale::En);
        assert_eq!(weekend.cells[0].value, 2);
        assert_eq!(weekend.cells[1].label, "Weekend");

        let years = count_by(&view, GroupKey::Year, WeekdayLocale::En);
        assert_eq!(years.cells.len(), 2);

        let heatmap = count_by_pair(&view, GroupKey::Weekday, GroupKey::Hour, WeekdayLocale::En);
        assert_eq!(heatmap.counts.len(), 7);
        assert_eq!(heatmap.counts[0].len(), 24);
        assert_eq!(heatmap.total(), 3);
        assert_eq!(heatmap.counts[3][14], 1);
    }

    #[test]
    fn sums_and_summary_use_exact_decimals() {
        let table = base(&[
            ("o1", "2017-06-15 14:30:00", "0.10", "toys"),
            ("o1", "2017-06-15 14:30:00", "0.20", "auto"),
            ("o2", "2017-07-01 10:00:00", "19.90", "toys"),
        ]);
        let view = FilteredView::all(&table);
        let by_month = sum_by(&view, GroupKey::Month, Measure::Price, WeekdayLocale::En).unwrap();
        assert_eq!(by_month.cells[5].value, Decimal::new(30, 2));
        assert_eq!(by_month.cells[6].value, Decimal::new(1990, 2));

        let totals = summary(&view).unwrap();
        assert_eq!(totals.item_rows, 3);
        assert_eq!(totals.distinct_orders, 2);
        assert_eq!(totals.distinct_products, 2);
        assert_eq!(totals.total_revenue, Decimal::new(2020, 2));
        assert_eq!(totals.mean_price, Some(Decimal::new(673, 2)));
        assert_eq!(by_month.cells[0].value.to_string(), "0.00");
    }

    #[test]
    fn revenue_overflow_is_an_error() {
        let table = base(&[
            ("o1", "2017-06-15 14:30:00", "4e28", "toys"),
            ("o2", "2017-06-15 15:30:00", "4e28", "toys"),
        ]);
        let view = FilteredView::all(&table);
        assert!(matches!(summary(&view), Err(PipelineError::Overflow(_))));
        assert!(matches!(
            sum_by(&view, GroupKey::Month, Measure::Price, WeekdayLocale::En),
            Err(PipelineError::Overflow(_))
        ));
    }

    #[test]
    fn unrepresentable_prices_are_left_out_of_sums() {
        let table = base(&[
            ("o1", "2017-06-15 14:30:00", "1e30", "toys"),
            ("o2", "2017-06-15 15:30:00", "12.50", "toys"),
        ]);
        let view = FilteredView::all(&table);
        let totals = summary(&view).unwrap();
        assert_eq!(totals.item_rows, 2);
        assert_eq!(totals.total_revenue, Decimal::new(1250, 2));
        assert_eq!(totals.mean_price, Some(Decimal::new(1250, 2)));
    }
}
