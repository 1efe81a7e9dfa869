mod aggregate;
mod domain;
mod export;
mod fields;
mod mapping;
mod metrics;
mod names;
mod normalizer;
mod parser;
mod quality;
mod ranking;
mod report;
mod semantic;

use crate::config::ScoringConfig;
use chrono::NaiveDateTime;
use std::io::Read;
use std::path::Path;
use tracing::info;

pub(crate) use aggregate::round_to;
pub(crate) use semantic::median;

pub use aggregate::{aggregate, composite_score, AgentPerformanceSummary};
pub use domain::{CleanedDataset, Column, GoalFlags, PerformanceEvent};
pub use export::{write_cleaned, write_performer_names, write_semantic, write_summaries};
pub use fields::{Cell, CellKind, ColumnSet, Field};
pub use mapping::{SemanticColumn, SEMANTIC_MAPPING};
pub use metrics::{calls_per_hour, enrich, performance_score, GoalTargets};
pub use names::{parse_agent_name, ParsedName};
pub use normalizer::{clean_label, combine_date, normalize};
pub use parser::RawTable;
pub use quality::{count_duplicates, validate, ColumnCount, ColumnType, DataQualityReport, ValueRange};
pub use ranking::{top_performers, Ranking, MIN_DAYS_WORKED};
pub use report::{
    render_quality_report, render_top_performer_report, render_transformation_log,
    PerformerReportContext,
};
pub use semantic::{
    transform, EfficiencyCategory, PerformanceTier, SemanticDataset, SemanticRecord,
    SemanticSlot, TransformationLog, ValidationSummary,
};

#[derive(Debug)]
pub enum PipelineError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io(err) => write!(f, "failed to read performance export: {}", err),
            PipelineError::Csv(err) => write!(f, "invalid performance CSV data: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io(err) => Some(err),
            PipelineError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Result of the cleaning stages alone.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub dataset: CleanedDataset,
    pub quality: DataQualityReport,
}

/// Every stage output of a full run, for the caller to persist.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub cleaned: CleanedDataset,
    pub quality: DataQualityReport,
    pub semantic: SemanticDataset,
    pub summaries: Vec<AgentPerformanceSummary>,
    pub ranking: Ranking,
}

/// Drives clean → semantic transform → aggregate → rank. Each stage consumes the
/// previous stage's output; the quality report is owned here and handed back.
#[derive(Debug, Clone)]
pub struct PerformancePipeline {
    goals: GoalTargets,
    top_n: usize,
}

impl Default for PerformancePipeline {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

impl PerformancePipeline {
    pub fn new(scoring: &ScoringConfig) -> Self {
        Self {
            goals: scoring.goals,
            top_n: scoring.top_n,
        }
    }

    pub fn goals(&self) -> &GoalTargets {
        &self.goals
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn clean_path<P: AsRef<Path>>(&self, path: P) -> Result<CleanOutcome, PipelineError> {
        let file = std::fs::File::open(path)?;
        self.clean_reader(file)
    }

    pub fn clean_reader<R: Read>(&self, reader: R) -> Result<CleanOutcome, PipelineError> {
        let raw = parser::parse_table(reader)?;
        info!(
            rows = raw.rows.len(),
            columns = raw.headers.len(),
            "loaded performance export"
        );

        let mut quality = DataQualityReport::default();
        let dataset = normalize(raw, &mut quality);
        let dataset = enrich(dataset, &self.goals);
        validate(&dataset, &mut quality);

        Ok(CleanOutcome { dataset, quality })
    }

    pub fn run_path<P: AsRef<Path>>(
        &self,
        path: P,
        processed_at: NaiveDateTime,
    ) -> Result<PipelineOutcome, PipelineError> {
        let file = std::fs::File::open(path)?;
        self.run_reader(file, processed_at)
    }

    pub fn run_reader<R: Read>(
        &self,
        reader: R,
        processed_at: NaiveDateTime,
    ) -> Result<PipelineOutcome, PipelineError> {
        let CleanOutcome { dataset, quality } = self.clean_reader(reader)?;
        let semantic = transform(&dataset, processed_at);
        let summaries = aggregate(&semantic);
        let ranking = top_performers(&summaries, self.top_n);

        Ok(PipelineOutcome {
            cleaned: dataset,
            quality,
            semantic,
            summaries,
            ranking,
        })
    }
}
