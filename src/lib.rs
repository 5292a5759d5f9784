pub mod aggregate;
pub mod cli;
pub mod config;
pub mod config_cmd;
pub mod data;
pub mod dataset;
pub mod enrich;
pub mod error;
pub mod export;
pub mod filter;
pub mod impute;
pub mod io_utils;
pub mod join;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod settings;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::{
    cli::{Cli, Commands},
    error::PipelineError,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("order_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Summary(args) => report::execute_summary(&args),
        Commands::Categories(args) => report::execute_categories(&args),
        Commands::Timing(args) => report::execute_timing(&args),
        Commands::Revenue(args) => report::execute_revenue(&args),
        Commands::Report(args) => report::execute_report(&args),
        Commands::Export(args) => export::execute(&args),
        Commands::Config(args) => config_cmd::execute(&args),
    }
}

/// Extra guidance for failures a user can fix by pointing at the right files.
pub fn failure_hint(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<PipelineError>())
        .find(|cause| cause.is_missing_input())
        .map(|_| {
            format!(
                "hint: expected the dataset CSV files in '{}' (override with --data-dir or data_dir in --config)",
                config::DEFAULT_DATA_DIR
            )
        })
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
