//! Composition of the preparation stages.
//!
//! `load -> impute -> join -> enrich` runs once and leaves an
//! [`EnrichedTable`] cached in a [`Dashboard`]. Every view afterwards only
//! re-filters that base.

use encoding_rs::Encoding;
use log::info;

use crate::{
    aggregate::{self, CategoryCount, Grid1, Grid2, GroupKey, Measure, Summary},
    config::PipelineConfig,
    dataset::{self, SourceTables},
    enrich::{self, EnrichedTable},
    error::PipelineResult,
    filter::{self, FilterSpec, FilteredView, SelectionWarning},
    impute::{self, ImputationReport},
    join,
};

/// Imputes every source table in place.
pub fn clean_sources(sources: &mut SourceTables) -> Vec<ImputationReport> {
    sources
        .tables_mut()
        .into_iter()
        .map(|table| {
            let report = impute::impute_table(table);
            info!(
                "Imputed {} missing cell(s) across {} column(s) in '{}'",
                report.filled_cells(),
                report.columns.len(),
                report.table
            );
            report
        })
        .collect()
}

/// Runs the stages after loading; useful when the tables come from memory.
pub fn prepare(
    mut sources: SourceTables,
    config: &PipelineConfig,
) -> PipelineResult<(EnrichedTable, Vec<ImputationReport>)> {
    let reports = clean_sources(&mut sources);
    let joined = join::build_joined_table(&sources, &config.fallback_category)?;
    let enriched = enrich::enrich(joined, config.year_window)?;
    Ok((enriched, reports))
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    config: PipelineConfig,
    base: EnrichedTable,
    imputation: Vec<ImputationReport>,
}

/// A filtered view, or the reason there is nothing to aggregate.
pub enum Selected<'a> {
    Rows(FilteredView<'a>),
    Skipped(SelectionWarning),
}

impl Dashboard {
    pub fn load(
        config: PipelineConfig,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    ) -> PipelineResult<Self> {
        config.validate()?;
        info!("Loading dataset from {:?}", config.data_dir);
        let sources = dataset::load_sources(&config.data_dir, &config.files, delimiter, encoding)?;
        Self::from_sources(config, sources)
    }

    pub fn from_sources(config: PipelineConfig, sources: SourceTables) -> PipelineResult<Self> {
        let (base, imputation) = prepare(sources, &config)?;
        info!("Enriched base table ready with {} row(s)", base.len());
        Ok(Self {
            config,
            base,
            imputation,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn base(&self) -> &EnrichedTable {
        &self.base
    }

    pub fn imputation(&self) -> &[ImputationReport] {
        &self.imputation
    }

    /// Applies `spec`, reporting empty selections and empty results as warnings.
    pub fn select(&self, spec: &FilterSpec) -> PipelineResult<Selected<'_>> {
        spec.validate()?;
        if let Some(warning) = spec.empty_selection_warning() {
            return Ok(Selected::Skipped(warning));
        }
        let view = filter::apply(&self.base, spec)?;
        if view.is_empty() {
            return Ok(Selected::Skipped(SelectionWarning::NoMatchingRows));
        }
        info!("{} of {} row(s) pass the filters", view.len(), self.base.len());
        Ok(Selected::Rows(view))
    }

    pub fn top_categories(&self, view: &FilteredView<'_>) -> Vec<CategoryCount> {
        aggregate::category_counts(view, self.config.top_k, self.config.tie_break)
    }

    pub fn counts(&self, view: &FilteredView<'_>, key: GroupKey) -> Grid1<usize> {
        aggregate::count_by(view, key, self.config.weekday_locale)
    }

    pub fn heatmap(&self, view: &FilteredView<'_>) -> Grid2 {
        aggregate::count_by_pair(
            view,
            GroupKey::Weekday,
            GroupKey::Hour,
            self.config.weekday_locale,
        )
    }

    pub fn revenue(
        &self,
        view: &FilteredView<'_>,
        key: GroupKey,
    ) -> PipelineResult<Grid1<rust_decimal::Decimal>> {
        aggregate::sum_by(view, key, Measure::Price, self.config.weekday_locale)
    }

    pub fn summary(&self, view: &FilteredView<'_>) -> PipelineResult<Summary> {
        aggregate::summary(view)
    }
}
