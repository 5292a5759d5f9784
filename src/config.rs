//! Pipeline configuration persisted as YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock dashboard behaviour. Command-line flags override individual fields
//! after loading.

use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_DATA_DIR: &str = "E-Commerce Public Dataset";
pub const DEFAULT_FALLBACK_CATEGORY: &str = "Unknown";
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetFiles {
    pub orders: String,
    pub order_items: String,
    pub products: String,
    pub category_translation: String,
    pub customers: String,
    pub payments: String,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            orders: "orders_dataset.csv".into(),
            order_items: "order_items_dataset.csv".into(),
            products: "products_dataset.csv".into(),
            category_translation: "product_category_name_translation.csv".into(),
            customers: "customers_dataset.csv".into(),
            payments: "order_payments_dataset.csv".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
}

impl YearWindow {
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Equal counts are ordered by label, ascending
    #[default]
    NameAscending,
    /// Equal counts keep the order the labels first appear in the data
    FirstSeen,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum EmptySelectionPolicy {
    /// An explicitly empty year/weekday selection is ignored
    #[default]
    NoConstraint,
    /// An explicitly empty selection matches nothing and aggregation is skipped
    SelectNone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum WeekdayLocale {
    #[default]
    En,
    Id,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub files: DatasetFiles,
    /// Purchases outside these years are dropped while enriching.
    pub year_window: Option<YearWindow>,
    pub date_range_filter: bool,
    pub default_date_range: DateWindow,
    pub top_k: usize,
    pub weekday_locale: WeekdayLocale,
    pub tie_break: TieBreak,
    pub empty_selection: EmptySelectionPolicy,
    pub fallback_category: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            files: DatasetFiles::default(),
            year_window: Some(YearWindow {
                start: 2016,
                end: 2018,
            }),
            date_range_filter: true,
            default_date_range: DateWindow {
                start: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default(),
                end: NaiveDate::from_ymd_opt(2018, 12, 31).unwrap_or_default(),
            },
            top_k: DEFAULT_TOP_K,
            weekday_locale: WeekdayLocale::default(),
            tie_break: TieBreak::default(),
            empty_selection: EmptySelectionPolicy::default(),
            fallback_category: DEFAULT_FALLBACK_CATEGORY.into(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: PipelineConfig =
            serde_yaml::from_reader(reader).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing config to YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        let mut file =
            File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Writing config file {path:?}"))?;
        Ok(())
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if let Some(window) = &self.year_window
            && window.start > window.end
        {
            return Err(PipelineError::Config(format!(
                "year_window start {} is after end {}",
                window.start, window.end
            )));
        }
        if self.default_date_range.start > self.default_date_range.end {
            return Err(PipelineError::Config(format!(
                "default_date_range start {} is after end {}",
                self.default_date_range.start, self.default_date_range.end
            )));
        }
        if self.fallback_category.trim().is_empty() {
            return Err(PipelineError::Config(
                "fallback_category cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.top_k, 10);
        assert_eq!(config.fallback_category, "Unknown");
    }

    #[test]
    fn partial_yaml_overrides_selected_fields() {
        let yaml = "top_k: 5\ntie_break: first-seen\nempty_selection: select-none\nweekday_locale: id\nyear_window: null\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.tie_break, TieBreak::FirstSeen);
        assert_eq!(config.empty_selection, EmptySelectionPolicy::SelectNone);
        assert_eq!(config.weekday_locale, WeekdayLocale::Id);
        assert_eq!(config.year_window, None);
        assert_eq!(config.files, DatasetFiles::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<PipelineConfig>("top_n: 3").is_err());
    }

    #[test]
    fn validate_rejects_inverted_year_window() {
        let config = PipelineConfig {
            year_window: Some(YearWindow {
                start: 2019,
                end: 2016,
            }),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
