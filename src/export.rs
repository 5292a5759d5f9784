use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    cli::ExportArgs,
    io_utils,
    pipeline::Selected,
    settings,
};

/// Writes the enriched rows that pass the filters, calendar columns included.
///
/// When the selection is skipped only the header row is written.
pub fn execute(args: &ExportArgs) -> Result<()> {
    let config = settings::resolve_config(&args.source)?;
    let spec = settings::build_filter(&args.filters, &config);
    let dashboard = settings::open_dashboard(&args.source, config)?;

    let output_path = args.output.as_deref();
    let delimiter = io_utils::resolve_output_delimiter(
        output_path,
        args.output_delimiter,
        io_utils::DEFAULT_CSV_DELIMITER,
    );
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let base = dashboard.base();

    let selected = dashboard.select(&spec)?;
    let rows: &[usize] = match &selected {
        Selected::Rows(view) => view.rows(),
        Selected::Skipped(warning) => {
            warn!("{warning}; writing headers only");
            &[]
        }
    };

    let mut writer = io_utils::open_csv_writer(output_path, delimiter, encoding)?;
    writer
        .write_record(base.export_headers())
        .context("Writing header row")?;
    for &row in rows {
        writer
            .write_record(base.export_row(row))
            .with_context(|| format!("Writing row {}", row + 1))?;
    }
    writer.flush().context("Flushing output")?;
    info!(
        "Exported {} of {} row(s) with delimiter '{}'",
        rows.len(),
        base.len(),
        crate::printable_delimiter(delimiter)
    );
    Ok(())
}
