use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    aggregate::GroupKey,
    config::{EmptySelectionPolicy, TieBreak, WeekdayLocale},
    data::parse_naive_date,
    filter::parse_weekday,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Join, clean, and summarize e-commerce order CSV exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Headline numbers: distinct orders and products, mean price, revenue
    Summary(ViewArgs),
    /// Best-selling product categories by number of purchased items
    Categories(CategoriesArgs),
    /// Purchase counts by weekday, weekend, hour, month, year, or weekday x hour
    Timing(TimingArgs),
    /// Revenue (sum of item prices) grouped by a calendar field
    Revenue(RevenueArgs),
    /// Every dashboard view in one pass over the prepared data
    Report(CategoriesArgs),
    /// Write the filtered, enriched table as CSV
    Export(ExportArgs),
    /// Create or inspect the YAML configuration
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Directory holding the six dataset CSV files
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,
    /// YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Keep purchases from every year instead of the configured year window
    #[arg(long = "all-years")]
    pub all_years: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// First purchase date to include (inclusive)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,
    /// Last purchase date to include (inclusive)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
    /// Disable the date-range filter entirely
    #[arg(long = "no-date-filter", conflicts_with_all = ["start", "end"])]
    pub no_date_filter: bool,
    /// Restrict to these purchase years; pass the flag with no values for an empty selection
    #[arg(long, num_args = 0.., value_delimiter = ',')]
    pub years: Option<Vec<i32>>,
    /// Restrict to these weekdays (names, 3-letter names, or 0=Monday..6)
    #[arg(long, num_args = 0.., value_delimiter = ',', value_parser = parse_weekday_arg)]
    pub weekdays: Option<Vec<u32>>,
    /// Earliest hour of day to include (0-23)
    #[arg(long = "hour-min", value_parser = clap::value_parser!(u32).range(0..24))]
    pub hour_min: Option<u32>,
    /// Latest hour of day to include (0-23)
    #[arg(long = "hour-max", value_parser = clap::value_parser!(u32).range(0..24))]
    pub hour_max: Option<u32>,
    /// How an explicitly empty year/weekday selection is treated
    #[arg(long = "empty-selection", value_enum)]
    pub empty_selection: Option<EmptySelectionPolicy>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Language used for weekday labels
    #[arg(long, value_enum)]
    pub locale: Option<WeekdayLocale>,
}

#[derive(Debug, Clone, Args)]
pub struct CategoriesArgs {
    #[command(flatten)]
    pub view: ViewArgs,
    /// Number of categories to list (0 = all)
    #[arg(long)]
    pub top: Option<usize>,
    /// Ordering of categories with equal counts
    #[arg(long = "tie-break", value_enum)]
    pub tie_break: Option<TieBreak>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum TimingView {
    Weekday,
    Weekend,
    Hour,
    Month,
    Year,
    /// Weekday x hour grid
    Heatmap,
}

impl TimingView {
    pub fn group_key(&self) -> Option<GroupKey> {
        match self {
            TimingView::Weekday => Some(GroupKey::Weekday),
            TimingView::Weekend => Some(GroupKey::Weekend),
            TimingView::Hour => Some(GroupKey::Hour),
            TimingView::Month => Some(GroupKey::Month),
            TimingView::Year => Some(GroupKey::Year),
            TimingView::Heatmap => None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct TimingArgs {
    #[command(flatten)]
    pub view: ViewArgs,
    /// Which grouping to show
    #[arg(long = "view", value_enum, default_value = "weekday")]
    pub by: TimingView,
}

#[derive(Debug, Clone, Args)]
pub struct RevenueArgs {
    #[command(flatten)]
    pub view: ViewArgs,
    /// Calendar field to group revenue by
    #[arg(long = "by", value_enum, default_value = "month")]
    pub by: GroupKey,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a configuration file populated with the defaults
    Init(ConfigInitArgs),
    /// Print the configuration that would be used, after overrides
    Show(ConfigShowArgs),
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ConfigShowArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_naive_date(value.trim()).map_err(|err| err.to_string())
}

fn parse_weekday_arg(value: &str) -> Result<u32, String> {
    parse_weekday(value).map_err(|err| err.to_string())
}
