//! Handlers for the read-only views: summary, categories, timing, revenue,
//! and the combined report.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    aggregate::{CategoryCount, Grid1, Grid2, GroupKey, Summary, decimal_to_f64},
    cli::{CategoriesArgs, OutputFormat, RevenueArgs, TimingArgs, ViewArgs},
    data::format_float,
    filter::SelectionWarning,
    impute::{Fill, ImputationReport},
    pipeline::{Dashboard, Selected},
    settings, table,
};

const REPORT_VIEWS: [GroupKey; 4] = [
    GroupKey::Weekday,
    GroupKey::Weekend,
    GroupKey::Hour,
    GroupKey::Month,
];

pub fn execute_summary(args: &ViewArgs) -> Result<()> {
    let config = settings::resolve_view_config(args)?;
    let spec = settings::build_filter(&args.filters, &config);
    let dashboard = settings::open_dashboard(&args.source, config)?;
    let mut output = Output::new(args.format);
    match dashboard.select(&spec)? {
        Selected::Skipped(warning) => output.warning(&warning),
        Selected::Rows(view) => output.summary(&dashboard.summary(&view)?)?,
    }
    output.finish()
}

pub fn execute_categories(args: &CategoriesArgs) -> Result<()> {
    let config = settings::resolve_categories_config(args)?;
    let spec = settings::build_filter(&args.view.filters, &config);
    let dashboard = settings::open_dashboard(&args.view.source, config)?;
    let mut output = Output::new(args.view.format);
    match dashboard.select(&spec)? {
        Selected::Skipped(warning) => output.warning(&warning),
        Selected::Rows(view) => {
            output.categories(&dashboard, &dashboard.top_categories(&view))?
        }
    }
    output.finish()
}

pub fn execute_timing(args: &TimingArgs) -> Result<()> {
    let config = settings::resolve_view_config(&args.view)?;
    let spec = settings::build_filter(&args.view.filters, &config);
    let dashboard = settings::open_dashboard(&args.view.source, config)?;
    let mut output = Output::new(args.view.format);
    match dashboard.select(&spec)? {
        Selected::Skipped(warning) => output.warning(&warning),
        Selected::Rows(view) => match args.by.group_key() {
            Some(key) => output.counts(&dashboard.counts(&view, key))?,
            None => output.heatmap(&dashboard.heatmap(&view))?,
        },
    }
    output.finish()
}

pub fn execute_revenue(args: &RevenueArgs) -> Result<()> {
    let config = settings::resolve_view_config(&args.view)?;
    let spec = settings::build_filter(&args.view.filters, &config);
    let dashboard = settings::open_dashboard(&args.view.source, config)?;
    let mut output = Output::new(args.view.format);
    match dashboard.select(&spec)? {
        Selected::Skipped(warning) => output.warning(&warning),
        Selected::Rows(view) => output.revenue(&dashboard.revenue(&view, args.by)?)?,
    }
    output.finish()
}

pub fn execute_report(args: &CategoriesArgs) -> Result<()> {
    let config = settings::resolve_categories_config(args)?;
    let spec = settings::build_filter(&args.view.filters, &config);
    let dashboard = settings::open_dashboard(&args.view.source, config)?;
    let mut output = Output::new(args.view.format);
    output.imputation(dashboard.imputation())?;
    match dashboard.select(&spec)? {
        Selected::Skipped(warning) => output.warning(&warning),
        Selected::Rows(view) => {
            output.summary(&dashboard.summary(&view)?)?;
            output.categories(&dashboard, &dashboard.top_categories(&view))?;
            for key in REPORT_VIEWS {
                output.counts(&dashboard.counts(&view, key))?;
            }
            output.heatmap(&dashboard.heatmap(&view))?;
            info!("Rendered report over {} row(s)", view.len());
        }
    }
    output.finish()
}

fn count_title(key: GroupKey) -> &'static str {
    match key {
        GroupKey::Weekday => "Purchase Frequency by Day of Week",
        GroupKey::Weekend => "Purchase Frequency: Weekday vs. Weekend",
        GroupKey::Hour => "Purchase Frequency by Hour of Day",
        GroupKey::Month => "Purchase Frequency by Month",
        GroupKey::Year => "Purchase Frequency by Year",
    }
}

/// Prints sections as tables immediately, or gathers them into one JSON object.
struct Output {
    format: OutputFormat,
    sections: Map<String, JsonValue>,
}

impl Output {
    fn new(format: OutputFormat) -> Self {
        Self {
            format,
            sections: Map::new(),
        }
    }

    fn emit<T, F>(&mut self, key: &str, title: &str, value: &T, layout: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> (Vec<String>, Vec<Vec<String>>),
    {
        match self.format {
            OutputFormat::Table => {
                let (headers, rows) = layout();
                table::print_table(title, &headers, &rows);
            }
            OutputFormat::Json => {
                let json = serde_json::to_value(value)
                    .with_context(|| format!("Serializing '{key}' view"))?;
                self.sections.insert(key.to_string(), json);
            }
        }
        Ok(())
    }

    fn warning(&mut self, warning: &SelectionWarning) {
        warn!("{warning}");
        match self.format {
            OutputFormat::Table => println!("warning: {warning}"),
            OutputFormat::Json => {
                self.sections
                    .insert("warning".into(), JsonValue::String(warning.to_string()));
            }
        }
    }

    fn summary(&mut self, summary: &Summary) -> Result<()> {
        self.emit("summary", "Summary", summary, || {
            let rows = vec![
                vec!["items purchased".into(), summary.item_rows.to_string()],
                vec!["distinct orders".into(), summary.distinct_orders.to_string()],
                vec![
                    "distinct products".into(),
                    summary.distinct_products.to_string(),
                ],
                vec![
                    "distinct customers".into(),
                    summary.distinct_customers.to_string(),
                ],
                vec![
                    "mean price".into(),
                    summary
                        .mean_price
                        .map(|p| p.to_string())
                        .unwrap_or_default(),
                ],
                vec!["total revenue".into(), summary.total_revenue.to_string()],
            ];
            (vec!["metric".into(), "value".into()], rows)
        })
    }

    fn imputation(&mut self, reports: &[ImputationReport]) -> Result<()> {
        self.emit("imputation", "Missing Values Filled", &reports, || {
            let rows = reports
                .iter()
                .flat_map(|report| {
                    report.columns.iter().map(|column| {
                        let fill = match &column.fill {
                            Fill::Mean(mean) => format!("mean {}", format_float(*mean)),
                            Fill::Mode(mode) => format!("mode {mode}"),
                            Fill::Unfillable => "left empty".to_string(),
                        };
                        vec![
                            report.table.clone(),
                            column.column.clone(),
                            column.missing.to_string(),
                            fill,
                        ]
                    })
                })
                .collect();
            (
                vec![
                    "table".into(),
                    "column".into(),
                    "missing".into(),
                    "filled with".into(),
                ],
                rows,
            )
        })
    }

    fn categories(&mut self, dashboard: &Dashboard, counts: &[CategoryCount]) -> Result<()> {
        let title = match dashboard.config().top_k {
            0 => "Best-Selling Product Categories".to_string(),
            k => format!("Top {k} Best-Selling Product Categories"),
        };
        self.emit("categories", &title, &counts, || {
            let mut rows = counts
                .iter()
                .map(|c| vec![c.category.clone(), c.count.to_string()])
                .collect::<Vec<_>>();
            let values = counts.iter().map(|c| c.count as f64).collect::<Vec<_>>();
            table::with_bars(&mut rows, &values);
            (
                vec!["category".into(), "purchases".into(), String::new()],
                rows,
            )
        })
    }

    fn counts(&mut self, grid: &Grid1<usize>) -> Result<()> {
        self.emit(grid.key.title(), count_title(grid.key), grid, || {
            let mut rows = grid
                .cells
                .iter()
                .map(|c| vec![c.label.clone(), c.value.to_string()])
                .collect::<Vec<_>>();
            let values = grid.cells.iter().map(|c| c.value as f64).collect::<Vec<_>>();
            table::with_bars(&mut rows, &values);
            (
                vec![grid.key.title().into(), "purchases".into(), String::new()],
                rows,
            )
        })
    }

    fn revenue(&mut self, grid: &Grid1<rust_decimal::Decimal>) -> Result<()> {
        let title = format!("Revenue by {}", grid.key.title());
        self.emit("revenue", &title, grid, || {
            let mut rows = grid
                .cells
                .iter()
                .map(|c| vec![c.label.clone(), c.value.to_string()])
                .collect::<Vec<_>>();
            let values = grid
                .cells
                .iter()
                .map(|c| decimal_to_f64(c.value))
                .collect::<Vec<_>>();
            table::with_bars(&mut rows, &values);
            (
                vec![grid.key.title().into(), "revenue".into(), String::new()],
                rows,
            )
        })
    }

    fn heatmap(&mut self, grid: &Grid2) -> Result<()> {
        self.emit(
            "heatmap",
            "Purchases by Day of Week and Hour of Day",
            grid,
            || {
                let mut headers = vec![grid.rows_key.title().to_string()];
                headers.extend(grid.column_labels.iter().cloned());
                let rows = grid
                    .row_labels
                    .iter()
                    .zip(&grid.counts)
                    .map(|(label, counts)| {
                        let mut row = vec![label.clone()];
                        row.extend(counts.iter().map(|c| c.to_string()));
                        row
                    })
                    .collect();
                (headers, rows)
            },
        )
    }

    fn finish(self) -> Result<()> {
        if self.format == OutputFormat::Json {
            let rendered = serde_json::to_string_pretty(&JsonValue::Object(self.sections))
                .context("Rendering JSON output")?;
            println!("{rendered}");
        }
        Ok(())
    }
}
