//! Merges the YAML configuration with command-line overrides.

use anyhow::{Context, Result};
use log::debug;

use crate::{
    cli::{CategoriesArgs, FilterArgs, SourceArgs, ViewArgs},
    config::PipelineConfig,
    filter::{FilterSpec, Selection},
    io_utils,
    pipeline::Dashboard,
};

pub fn resolve_config(source: &SourceArgs) -> Result<PipelineConfig> {
    let mut config = match &source.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &source.data_dir {
        config.data_dir = dir.clone();
    }
    if source.all_years {
        config.year_window = None;
    }
    Ok(config)
}

pub fn resolve_view_config(view: &ViewArgs) -> Result<PipelineConfig> {
    let mut config = resolve_config(&view.source)?;
    if let Some(locale) = view.locale {
        config.weekday_locale = locale;
    }
    if let Some(policy) = view.filters.empty_selection {
        config.empty_selection = policy;
    }
    Ok(config)
}

pub fn resolve_categories_config(args: &CategoriesArgs) -> Result<PipelineConfig> {
    let mut config = resolve_view_config(&args.view)?;
    if let Some(top) = args.top {
        config.top_k = top;
    }
    if let Some(tie_break) = args.tie_break {
        config.tie_break = tie_break;
    }
    Ok(config)
}

/// Translates filter flags into a [`FilterSpec`] under `config`'s defaults.
pub fn build_filter(filters: &FilterArgs, config: &PipelineConfig) -> FilterSpec {
    let explicit_range = filters.start.is_some() || filters.end.is_some();
    let date_range = if filters.no_date_filter {
        None
    } else if explicit_range || config.date_range_filter {
        Some((
            filters.start.unwrap_or(config.default_date_range.start),
            filters.end.unwrap_or(config.default_date_range.end),
        ))
    } else {
        None
    };
    let hours = match (filters.hour_min, filters.hour_max) {
        (None, None) => None,
        (min, max) => Some((min.unwrap_or(0), max.unwrap_or(23))),
    };
    let spec = FilterSpec {
        date_range,
        years: Selection::from_values(filters.years.clone()),
        weekdays: Selection::from_values(filters.weekdays.clone()),
        hours,
        empty_selection: filters.empty_selection.unwrap_or(config.empty_selection),
    };
    debug!("Filter: {spec:?}");
    spec
}

/// Loads and prepares the dataset described by `source` and `config`.
pub fn open_dashboard(source: &SourceArgs, config: PipelineConfig) -> Result<Dashboard> {
    let encoding = io_utils::resolve_encoding(source.input_encoding.as_deref())?;
    if let Some(delimiter) = source.delimiter {
        debug!(
            "Reading inputs with delimiter '{}'",
            crate::printable_delimiter(delimiter)
        );
    }
    let data_dir = config.data_dir.clone();
    Dashboard::load(config, source.delimiter, encoding)
        .with_context(|| format!("Preparing dataset from {data_dir:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn no_filters() -> FilterArgs {
        FilterArgs {
            start: None,
            end: None,
            no_date_filter: false,
            years: None,
            weekdays: None,
            hour_min: None,
            hour_max: None,
            empty_selection: None,
        }
    }

    #[test]
    fn default_date_range_comes_from_config() {
        let config = PipelineConfig::default();
        let spec = build_filter(&no_filters(), &config);
        assert_eq!(
            spec.date_range,
            Some((
                NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2018, 12, 31).unwrap()
            ))
        );
        assert_eq!(spec.hours, None);
    }

    #[test]
    fn explicit_bounds_override_and_half_open_hours_fill_in() {
        let config = PipelineConfig {
            date_range_filter: false,
            ..PipelineConfig::default()
        };
        assert_eq!(build_filter(&no_filters(), &config).date_range, None);

        let filters = FilterArgs {
            start: NaiveDate::from_ymd_opt(2017, 3, 1),
            hour_min: Some(18),
            ..no_filters()
        };
        let spec = build_filter(&filters, &config);
        assert_eq!(
            spec.date_range,
            Some((
                NaiveDate::from_ymd_opt(2017, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2018, 12, 31).unwrap()
            ))
        );
        assert_eq!(spec.hours, Some((18, 23)));
    }

    #[test]
    fn no_date_filter_wins_over_config() {
        let filters = FilterArgs {
            no_date_filter: true,
            ..no_filters()
        };
        assert_eq!(
            build_filter(&filters, &PipelineConfig::default()).date_range,
            None
        );
    }
}
