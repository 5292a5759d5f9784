use chrono::{Datelike, NaiveDate, Timelike};
use proptest::prelude::*;

use order_insights::aggregate::{self, GroupKey};
use order_insights::config::{TieBreak, WeekdayLocale};
use order_insights::dataset::Table;
use order_insights::enrich::{self, Calendar, EnrichedTable};
use order_insights::filter::{self, FilterSpec, FilteredView, Selection};

fn timestamp_strategy() -> impl Strategy<Value = chrono::NaiveDateTime> {
    (2016i32..=2018, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60).prop_map(
        |(year, month, day, hour, minute)| {
            NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap()
        },
    )
}

fn purchases_strategy() -> impl Strategy<Value = Vec<(chrono::NaiveDateTime, u8, u32)>> {
    proptest::collection::vec((timestamp_strategy(), 0u8..5, 1u32..50_000), 1..60)
}

fn build_base(purchases: &[(chrono::NaiveDateTime, u8, u32)]) -> EnrichedTable {
    let headers = [
        "order_id",
        "order_purchase_timestamp",
        "product_id",
        "price",
        "product_category_name",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let rows = purchases
        .iter()
        .enumerate()
        .map(|(idx, (ts, category, cents))| {
            vec![
                format!("o{idx}"),
                ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                format!("p{category}"),
                format!("{}.{:02}", cents / 100, cents % 100),
                format!("cat_{category}"),
            ]
        })
        .collect();
    let table = Table::from_raw("joined", headers, rows).unwrap();
    enrich::enrich(table, None).unwrap()
}

proptest! {
    #[test]
    fn calendar_fields_agree_with_the_timestamp(ts in timestamp_strategy()) {
        let calendar = Calendar::from_timestamp(ts);
        prop_assert_eq!(calendar.year(), ts.year());
        prop_assert_eq!(calendar.month(), ts.month());
        prop_assert_eq!(calendar.day(), ts.day());
        prop_assert_eq!(calendar.hour(), ts.hour());
        prop_assert_eq!(calendar.weekday(), ts.weekday().num_days_from_monday());
        prop_assert!(calendar.weekday() <= 6);
        prop_assert_eq!(calendar.is_weekend(), calendar.weekday() >= 5);
    }

    #[test]
    fn every_grid_conserves_the_view_size(purchases in purchases_strategy()) {
        let base = build_base(&purchases);
        let view = FilteredView::all(&base);
        for key in [GroupKey::Weekday, GroupKey::Weekend, GroupKey::Hour, GroupKey::Month, GroupKey::Year] {
            prop_assert_eq!(aggregate::count_by(&view, key, WeekdayLocale::En).total(), view.len());
        }
        let heatmap = aggregate::count_by_pair(&view, GroupKey::Weekday, GroupKey::Hour, WeekdayLocale::En);
        prop_assert_eq!(heatmap.total(), view.len());
        let categories: usize = aggregate::category_counts(&view, 0, TieBreak::NameAscending)
            .iter()
            .map(|c| c.count)
            .sum();
        prop_assert_eq!(categories, view.len());
    }

    #[test]
    fn top_k_is_sorted_and_bounded(purchases in purchases_strategy(), top_k in 1usize..6) {
        let base = build_base(&purchases);
        let view = FilteredView::all(&base);
        let top = aggregate::category_counts(&view, top_k, TieBreak::NameAscending);
        prop_assert!(top.len() <= top_k);
        for pair in top.windows(2) {
            prop_assert!(
                pair[0].count > pair[1].count
                    || (pair[0].count == pair[1].count && pair[0].category < pair[1].category)
            );
        }
    }

    #[test]
    fn revenue_sums_match_the_summary_total(purchases in purchases_strategy()) {
        let base = build_base(&purchases);
        let view = FilteredView::all(&base);
        let by_month = aggregate::sum_by(&view, GroupKey::Month, aggregate::Measure::Price, WeekdayLocale::En).unwrap();
        let grouped: rust_decimal::Decimal = by_month.cells.iter().map(|c| c.value).sum();
        prop_assert_eq!(grouped, aggregate::summary(&view).unwrap().total_revenue);
    }

    #[test]
    fn narrowing_hours_never_adds_rows(
        purchases in purchases_strategy(),
        min in 0u32..24,
        span in 0u32..24,
    ) {
        let base = build_base(&purchases);
        let max = (min + span).min(23);
        let wide = filter::apply(&base, &FilterSpec {
            hours: Some((min, 23)),
            ..FilterSpec::default()
        }).unwrap();
        let narrow = filter::apply(&base, &FilterSpec {
            hours: Some((min, max)),
            weekdays: Selection::from_values(Some(vec![0, 2, 4, 6])),
            ..FilterSpec::default()
        }).unwrap();
        prop_assert!(narrow.len() <= wide.len());
        prop_assert!(narrow.rows().iter().all(|row| wide.rows().contains(row)));
        let all_in_hours = narrow.rows().iter().all(|row| {
            let hour = base.calendar(*row).hour();
            (min..=max).contains(&hour)
        });
        prop_assert!(all_in_hours);
    }
}
