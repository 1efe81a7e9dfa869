use super::domain::CleanedDataset;
use super::fields::{Cell, CellKind, Field};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Data-quality signals accumulated while cleaning an export. Row-level problems land
/// here instead of failing the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataQualityReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub missing_values_before: Vec<ColumnCount>,
    pub missing_values_after: Vec<ColumnCount>,
    pub duplicate_rows: usize,
    pub column_types: Vec<ColumnType>,
    pub aht_range: Option<ValueRange>,
    pub invalid_dates: usize,
    pub unparsed_names: usize,
    pub percentage_columns: Vec<String>,
    pub zero_filled_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnCount {
    pub column: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnType {
    pub column: String,
    pub kind: CellKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Columns with at least one missing value, in layout order.
pub(crate) fn missing_counts(dataset: &CleanedDataset) -> Vec<ColumnCount> {
    dataset
        .layout()
        .into_iter()
        .filter_map(|column| {
            let count = dataset
                .events
                .iter()
                .filter(|event| dataset.cell(event, column).is_null())
                .count();
            (count > 0).then(|| ColumnCount {
                column: dataset.label(column).to_string(),
                count,
            })
        })
        .collect()
}

/// Counts rows repeating an earlier (identity, date) pair. Duplicates are reported,
/// never removed.
pub fn count_duplicates(dataset: &CleanedDataset) -> usize {
    let mut seen = HashSet::new();
    dataset
        .events
        .iter()
        .filter(|event| !seen.insert((event.agent_name.as_deref(), event.date)))
        .count()
}

/// Final validation pass over the enriched dataset.
pub fn validate(dataset: &CleanedDataset, report: &mut DataQualityReport) {
    report.duplicate_rows = count_duplicates(dataset);

    report.column_types = dataset
        .layout()
        .into_iter()
        .map(|column| {
            let cells: Vec<Cell> = dataset
                .events
                .iter()
                .map(|event| dataset.cell(event, column))
                .collect();
            ColumnType {
                column: dataset.label(column).to_string(),
                kind: CellKind::infer(&cells),
            }
        })
        .collect();

    if dataset.columns.contains(Field::Aht) {
        report.aht_range = value_range(dataset.events.iter().filter_map(|event| event.aht));
    }

    info!(
        duplicates = report.duplicate_rows,
        "data validation complete"
    );
}

fn value_range<I: Iterator<Item = f64>>(values: I) -> Option<ValueRange> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        count += 1;
        sum += value;
        min = min.min(value);
        max = max.max(value);
    }
    (count > 0).then(|| ValueRange {
        min,
        max,
        mean: sum / count as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::performance::domain::PerformanceEvent;
    use chrono::NaiveDate;

    fn event(name: Option<&str>, date: Option<NaiveDate>) -> PerformanceEvent {
        PerformanceEvent {
            agent_name: name.map(str::to_string),
            date,
            ..PerformanceEvent::default()
        }
    }

    #[test]
    fn duplicates_are_counted_per_identity_and_date() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2);
        let dataset = CleanedDataset {
            events: vec![
                event(Some("SMITH,JOHN"), day),
                event(Some("SMITH,JOHN"), day),
                event(Some("SMITH,JOHN"), day),
                event(Some("DOE,JANE"), day),
                event(Some("DOE,JANE"), None),
                event(Some("DOE,JANE"), None),
            ],
            ..CleanedDataset::default()
        };
        assert_eq!(count_duplicates(&dataset), 3);
        assert_eq!(dataset.events.len(), 6);
    }

    #[test]
    fn value_range_summarizes_handle_times() {
        let range = value_range([300.0, 0.0, 600.0].into_iter()).expect("range");
        assert_eq!(range.min, 0.0);
        assert_eq!(range.max, 600.0);
        assert_eq!(range.mean, 300.0);
        assert!(value_range(std::iter::empty()).is_none());
    }
}
