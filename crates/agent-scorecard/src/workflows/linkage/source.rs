use super::domain::ApplicantRow;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Criteria handed to an applicant source. An empty client list selects every client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicantFilter {
    pub client_ids: Vec<i64>,
}

impl ApplicantFilter {
    pub fn for_clients(client_ids: Vec<i64>) -> Self {
        Self { client_ids }
    }

    pub fn matches(&self, row: &ApplicantRow) -> bool {
        if self.client_ids.is_empty() {
            return true;
        }
        row.get("client_id")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .is_some_and(|client_id| self.client_ids.contains(&client_id))
    }
}

/// Storage abstraction for applicant rows, so linking can be exercised without a database.
pub trait ApplicantSource {
    fn fetch(&self, filter: &ApplicantFilter) -> Result<Vec<ApplicantRow>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read applicant file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid applicant CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("applicant store unavailable: {0}")]
    Unavailable(String),
}

/// In-memory applicant rows.
#[derive(Debug, Clone, Default)]
pub struct StaticApplicantSource {
    rows: Vec<ApplicantRow>,
}

impl StaticApplicantSource {
    pub fn new(rows: Vec<ApplicantRow>) -> Self {
        Self { rows }
    }
}

impl ApplicantSource for StaticApplicantSource {
    fn fetch(&self, filter: &ApplicantFilter) -> Result<Vec<ApplicantRow>, SourceError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }
}

/// Applicant rows from a CSV export; headers become row keys.
#[derive(Debug, Clone)]
pub struct CsvApplicantSource {
    path: PathBuf,
}

impl CsvApplicantSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ApplicantRow>, SourceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(header, value)| (header.clone(), value.to_string()))
                    .collect(),
            );
        }
        Ok(rows)
    }
}

impl ApplicantSource for CsvApplicantSource {
    fn fetch(&self, filter: &ApplicantFilter) -> Result<Vec<ApplicantRow>, SourceError> {
        let file = std::fs::File::open(&self.path)?;
        let rows: Vec<ApplicantRow> = Self::read_rows(file)?
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect();
        debug!(path = %self.path.display(), rows = rows.len(), "read applicant rows");
        Ok(rows)
    }
}

/// Storage abstraction for applicant screening results (resume scores and AI assessments).
/// Several rows may describe the same applicant; callers merge them by applicant id.
pub trait AssessmentSource {
    fn fetch(&self, applicant_ids: &[i64]) -> Result<Vec<ApplicantRow>, SourceError>;
}

fn row_applicant_id(row: &ApplicantRow) -> Option<i64> {
    let value = row.get("applicant_id")?.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|id| id.fract() == 0.0).map(|id| id as i64))
}

fn select_applicants(rows: Vec<ApplicantRow>, applicant_ids: &[i64]) -> Vec<ApplicantRow> {
    rows.into_iter()
        .filter(|row| row_applicant_id(row).is_some_and(|id| applicant_ids.contains(&id)))
        .collect()
}

/// In-memory screening rows.
#[derive(Debug, Clone, Default)]
pub struct StaticAssessmentSource {
    rows: Vec<ApplicantRow>,
}

impl StaticAssessmentSource {
    pub fn new(rows: Vec<ApplicantRow>) -> Self {
        Self { rows }
    }
}

impl AssessmentSource for StaticAssessmentSource {
    fn fetch(&self, applicant_ids: &[i64]) -> Result<Vec<ApplicantRow>, SourceError> {
        Ok(select_applicants(self.rows.clone(), applicant_ids))
    }
}

/// Screening rows from a CSV export with an `applicant_id` column.
#[derive(Debug, Clone)]
pub struct CsvAssessmentSource {
    path: PathBuf,
}

impl CsvAssessmentSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl AssessmentSource for CsvAssessmentSource {
    fn fetch(&self, applicant_ids: &[i64]) -> Result<Vec<ApplicantRow>, SourceError> {
        let file = std::fs::File::open(&self.path)?;
        let rows = select_applicants(CsvApplicantSource::read_rows(file)?, applicant_ids);
        debug!(path = %self.path.display(), rows = rows.len(), "read assessment rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(client_id: &str) -> ApplicantRow {
        [("client_id".to_string(), client_id.to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn empty_filter_selects_all_clients() {
        let source = StaticApplicantSource::new(vec![row("53"), row("999"), ApplicantRow::new()]);
        assert_eq!(source.fetch(&ApplicantFilter::default()).expect("fetch").len(), 3);

        let filtered = source
            .fetch(&ApplicantFilter::for_clients(vec![53, 625]))
            .expect("fetch");
        assert_eq!(filtered, vec![row("53")]);
    }

    #[test]
    fn csv_rows_are_keyed_by_lowercased_headers() {
        let csv = "\u{feff}First_Name,last_name,Client_ID\nJane,Doe,53\n";
        let rows = CsvApplicantSource::read_rows(csv.as_bytes()).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["first_name"], "Jane");
        assert_eq!(rows[0]["client_id"], "53");
    }

    #[test]
    fn assessment_rows_are_selected_by_applicant_id() {
        let csv = "applicant_id,resume_only_score\n1001,85.5\n1002.0,70\n,99\n";
        let source =
            StaticAssessmentSource::new(CsvApplicantSource::read_rows(csv.as_bytes()).expect("rows"));
        let rows = source.fetch(&[1002, 1003]).expect("fetch");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["resume_only_score"], "70");
        assert!(source.fetch(&[]).expect("fetch").is_empty());
    }

    #[test]
    fn missing_csv_file_is_an_io_error() {
        let source = CsvApplicantSource::new("missing/applicants.csv");
        let err = source
            .fetch(&ApplicantFilter::default())
            .expect_err("missing file");
        assert!(matches!(err, SourceError::Io(_)));
    }
}
