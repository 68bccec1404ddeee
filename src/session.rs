//! Session state and the read-only query surface.
//!
//! One [`AnalysisSession`] owns the current summary set and a memo cache
//! of derived views keyed by filter state. A file load either completes
//! and replaces the whole set, or fails and leaves prior state untouched;
//! nothing is ever mutated in place, which is what makes memoization by
//! structural key safe.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::analyzers::compare::{self, GroupStats, HeatmapCell, ScatterView};
use crate::analyzers::filter::{self, FilterState};
use crate::analyzers::stats::{self, StatsSummary};
use crate::analyzers::tiers::{self, PerformanceTiers};
use crate::ingest::{self, IngestError, InputFormat};
use crate::timeline::{self, AnimalSummary, MISSING_TOKEN};

#[derive(Default)]
pub struct AnalysisSession {
    summaries: Arc<[AnimalSummary]>,
    filtered_cache: HashMap<FilterState, Arc<[AnimalSummary]>>,
    stats_cache: HashMap<FilterState, Option<Arc<StatsSummary>>>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the full ingestion pipeline over delimited text and installs
    /// the result. On error the previous state is kept as-is.
    pub fn load_csv(&mut self, text: &str) -> Result<usize, IngestError> {
        let rows = ingest::parse_csv(text)?;
        Ok(self.install(timeline::build_summaries(&rows)))
    }

    /// Same as [`Self::load_csv`] for spreadsheet bytes.
    pub fn load_spreadsheet(&mut self, bytes: &[u8]) -> Result<usize, IngestError> {
        let rows = ingest::parse_spreadsheet(bytes)?;
        Ok(self.install(timeline::build_summaries(&rows)))
    }

    /// Format-dispatched load for callers that already read the file.
    pub fn load_bytes(&mut self, format: InputFormat, bytes: &[u8]) -> Result<usize, IngestError> {
        match format {
            InputFormat::Csv => self.load_csv(&String::from_utf8_lossy(bytes)),
            InputFormat::Spreadsheet => self.load_spreadsheet(bytes),
        }
    }

    fn install(&mut self, summaries: Vec<AnimalSummary>) -> usize {
        let count = summaries.len();
        self.summaries = summaries.into();
        self.filtered_cache.clear();
        self.stats_cache.clear();
        info!(animals = count, "Summary set replaced");
        count
    }

    pub fn animal_count(&self) -> usize {
        self.summaries.len()
    }

    /// The filtered summary set, memoized per filter state.
    pub fn summaries(&mut self, filter: &FilterState) -> Arc<[AnimalSummary]> {
        if let Some(cached) = self.filtered_cache.get(filter) {
            return cached.clone();
        }
        let filtered: Arc<[AnimalSummary]> = filter::apply(&self.summaries, filter).into();
        self.filtered_cache
            .insert(filter.clone(), filtered.clone());
        filtered
    }

    /// Descriptive statistics for the filtered set, memoized per filter
    /// state; `None` when the filter matches nothing.
    pub fn stats(&mut self, filter: &FilterState) -> Option<Arc<StatsSummary>> {
        if let Some(cached) = self.stats_cache.get(filter) {
            return cached.clone();
        }
        let filtered = self.summaries(filter);
        let computed = stats::compute(&filtered).map(Arc::new);
        self.stats_cache.insert(filter.clone(), computed.clone());
        computed
    }

    pub fn comparative_by_sex(&mut self, filter: &FilterState) -> Vec<GroupStats> {
        compare::by_sex(&self.summaries(filter))
    }

    pub fn comparative_by_age(&mut self, filter: &FilterState) -> Vec<GroupStats> {
        compare::by_age(&self.summaries(filter))
    }

    pub fn performance_tiers(&mut self, filter: &FilterState) -> Option<PerformanceTiers> {
        let stats = self.stats(filter)?;
        let filtered = self.summaries(filter);
        tiers::classify(&filtered, &stats)
    }

    pub fn scatter(&mut self, filter: &FilterState) -> ScatterView {
        compare::scatter(&self.summaries(filter))
    }

    pub fn heatmap(&mut self, filter: &FilterState) -> Vec<HeatmapCell> {
        compare::heatmap(&self.summaries(filter))
    }

    /// Distinct locations of the loaded set, in first-appearance order.
    pub fn locations(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in self.summaries.iter() {
            if !out.contains(&s.location) {
                out.push(s.location.clone());
            }
        }
        out
    }

    /// Distinct sex tokens of the loaded set, in first-appearance order.
    /// The missing-value placeholder is not a selectable sex.
    pub fn sexes(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in self.summaries.iter() {
            if s.sex != MISSING_TOKEN && !out.contains(&s.sex) {
                out.push(s.sex.clone());
            }
        }
        out
    }
}
