use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::aggregate::{self, DashboardSummary};
use crate::derive::derive_metrics;
use crate::error::LoadError;
use crate::filter::{self, FilterCriteria};
use crate::loader;
use crate::record::{InjuryRecord, InjuryTable, MissedMatchColumn};

/// Everything the presentation layer needs for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub records: Vec<InjuryRecord>,
    pub summary: DashboardSummary,
}

/// The cleaned, analysis-ready table for a source. Selection and
/// aggregation run fresh on every call to [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Arc<InjuryTable>,
    cleaned: Vec<InjuryRecord>,
    histogram_bins: usize,
}

impl Pipeline {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let table = loader::load_cached(path)?;
        Ok(Self::from_shared(table))
    }

    pub fn from_table(table: InjuryTable) -> Self {
        Self::from_shared(Arc::new(table))
    }

    fn from_shared(source: Arc<InjuryTable>) -> Self {
        let derived = derive_metrics(&source);
        let cleaned = filter::retain_complete(derived.records);
        info!(
            loaded = source.len(),
            cleaned = cleaned.len(),
            "injury records ready for analysis"
        );
        Self {
            source,
            cleaned,
            histogram_bins: aggregate::DEFAULT_HISTOGRAM_BINS,
        }
    }

    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins.max(1);
        self
    }

    pub fn source(&self) -> &InjuryTable {
        &self.source
    }

    pub fn cleaned(&self) -> &[InjuryRecord] {
        &self.cleaned
    }

    pub fn missed_match_columns(&self) -> &[MissedMatchColumn] {
        &self.source.missed_match_columns
    }

    pub fn dropped(&self) -> usize {
        self.source.len().saturating_sub(self.cleaned.len())
    }

    pub fn team_options(&self) -> Vec<String> {
        filter::team_options(&self.cleaned)
    }

    pub fn position_options(&self) -> Vec<String> {
        filter::position_options(&self.cleaned)
    }

    pub fn initial_criteria(&self, team_count: usize) -> FilterCriteria {
        FilterCriteria::initial(&self.team_options(), &self.position_options(), team_count)
    }

    pub fn run(&self, criteria: &FilterCriteria) -> DashboardView {
        let records = filter::apply_selection(&self.cleaned, criteria);
        let summary = aggregate::summarize(&records, self.histogram_bins);
        DashboardView {
            criteria: criteria.clone(),
            records,
            summary,
        }
    }
}
