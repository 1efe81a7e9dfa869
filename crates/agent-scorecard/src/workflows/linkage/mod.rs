mod domain;
mod insights;
mod source;

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use tracing::{debug, info};

pub use domain::{
    recommends_hire, ApplicantRecord, ApplicantRow, AssessmentRecord, MatchedCandidate, NameKey,
    PerformerProfile,
};
pub use insights::{
    generate_insights, AssessmentInsights, ClientCount, LabelCount, LinkageInsights,
    PredictionAccuracy, ResumeInsights,
};
pub use source::{
    ApplicantFilter, ApplicantSource, AssessmentSource, CsvApplicantSource, CsvAssessmentSource,
    SourceError, StaticApplicantSource, StaticAssessmentSource,
};

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("performer data must be loaded before linking")]
    PerformersNotLoaded,
    #[error("applicant data must be loaded before linking")]
    ApplicantsNotLoaded,
}

/// Joins performer profiles to applicant records on normalized name, keeping pairs
/// whose application predates the performer's first recorded day.
#[derive(Debug, Default)]
pub struct RecordLinker {
    performers: Option<Vec<PerformerProfile>>,
    applicants: Option<Vec<ApplicantRecord>>,
}

impl RecordLinker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_performers(&mut self, performers: Vec<PerformerProfile>) -> usize {
        info!(performers = performers.len(), "loaded performer profiles");
        let count = performers.len();
        self.performers = Some(performers);
        count
    }

    pub fn load_applicants(&mut self, applicants: Vec<ApplicantRecord>) -> usize {
        info!(applicants = applicants.len(), "loaded applicants");
        let count = applicants.len();
        self.applicants = Some(applicants);
        count
    }

    /// Fetches rows from `source` and keeps those that form a valid applicant record.
    pub fn load_applicants_from<S>(
        &mut self,
        source: &S,
        filter: &ApplicantFilter,
    ) -> Result<usize, SourceError>
    where
        S: ApplicantSource + ?Sized,
    {
        let rows = source.fetch(filter)?;
        let fetched = rows.len();
        let applicants: Vec<ApplicantRecord> =
            rows.iter().filter_map(ApplicantRecord::from_row).collect();
        if applicants.len() < fetched {
            debug!(
                skipped = fetched - applicants.len(),
                "applicant rows without a usable name skipped"
            );
        }
        Ok(self.load_applicants(applicants))
    }

    pub fn link(&self) -> Result<Vec<MatchedCandidate>, LinkError> {
        let performers = self
            .performers
            .as_ref()
            .ok_or(LinkError::PerformersNotLoaded)?;
        let applicants = self
            .applicants
            .as_ref()
            .ok_or(LinkError::ApplicantsNotLoaded)?;

        let index = domain::index_applicants(applicants);
        let mut name_matches = 0usize;
        let mut matches = Vec::new();

        for performer in performers {
            let Some(candidates) = performer.key().and_then(|key| index.get(&key)) else {
                continue;
            };
            name_matches += candidates.len();
            matches.extend(
                candidates
                    .iter()
                    .filter_map(|applicant| MatchedCandidate::pair(performer, applicant)),
            );
        }

        info!(
            name_matches,
            matched = matches.len(),
            "matched performers to applicants"
        );
        Ok(matches)
    }
}

/// Fetches screening results for the matched applicants and attaches them by applicant
/// id, merging partial rows. Returns how many matches received a result.
pub fn attach_assessments<S>(matches: &mut [MatchedCandidate], source: &S) -> Result<usize, SourceError>
where
    S: AssessmentSource + ?Sized,
{
    let applicant_ids: Vec<i64> = matches
        .iter()
        .filter_map(|candidate| candidate.applicant_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if applicant_ids.is_empty() {
        return Ok(0);
    }

    let mut by_applicant: HashMap<i64, AssessmentRecord> = HashMap::new();
    for record in source
        .fetch(&applicant_ids)?
        .iter()
        .filter_map(AssessmentRecord::from_row)
    {
        match by_applicant.get_mut(&record.applicant_id) {
            Some(existing) => existing.merge(record),
            None => {
                by_applicant.insert(record.applicant_id, record);
            }
        }
    }

    let mut attached = 0usize;
    for candidate in matches.iter_mut() {
        let Some(assessment) = candidate
            .applicant_id
            .and_then(|id| by_applicant.get(&id))
        else {
            continue;
        };
        candidate.apply_assessment(assessment);
        attached += 1;
    }

    info!(
        requested = applicant_ids.len(),
        assessed = by_applicant.len(),
        attached,
        "attached screening results to matches"
    );
    Ok(attached)
}

pub fn write_matches<W: Write>(matches: &[MatchedCandidate], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for candidate in matches {
        out.serialize(candidate)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn performer(first: &str, last: &str, first_day: (i32, u32, u32)) -> PerformerProfile {
        PerformerProfile {
            first_name: first.to_string(),
            last_name: last.to_string(),
            first_performance_date: NaiveDate::from_ymd_opt(first_day.0, first_day.1, first_day.2),
            avg_performance_score: Some(82.5),
            max_performance_score: Some(91.0),
            performance_records_count: 14,
            avg_calls_per_hour: Some(11.2),
        }
    }

    fn applicant(first: &str, last: &str, applied: &str) -> ApplicantRow {
        [
            ("applicant_id", "1001"),
            ("first_name", first),
            ("last_name", last),
            ("application_date", applied),
            ("client_id", "53"),
            ("client_name", "AEP"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    fn linker(performers: Vec<PerformerProfile>, rows: Vec<ApplicantRow>) -> RecordLinker {
        let mut linker = RecordLinker::new();
        linker.load_performers(performers);
        linker
            .load_applicants_from(&StaticApplicantSource::new(rows), &ApplicantFilter::default())
            .expect("static source");
        linker
    }

    #[test]
    fn linking_requires_both_datasets() {
        let mut linker = RecordLinker::new();
        assert!(matches!(linker.link(), Err(LinkError::PerformersNotLoaded)));
        linker.load_performers(Vec::new());
        assert!(matches!(linker.link(), Err(LinkError::ApplicantsNotLoaded)));
        linker.load_applicants(Vec::new());
        assert!(linker.link().expect("both loaded").is_empty());
    }

    #[test]
    fn application_before_first_day_matches_once() {
        let linker = linker(
            vec![performer("JANE", "DOE", (2020, 1, 1))],
            vec![applicant("Jane", "Doe", "2019-05-01")],
        );
        let matches = linker.link().expect("link");
        assert_eq!(matches.len(), 1);
        let jane = &matches[0];
        assert_eq!(jane.application_date, NaiveDate::from_ymd_opt(2019, 5, 1).expect("date"));
        assert_eq!(jane.years_since_application, 1);
        assert_eq!(jane.client_name.as_deref(), Some("AEP"));
    }

    #[test]
    fn application_after_first_day_is_excluded() {
        let linker = linker(
            vec![performer("JANE", "DOE", (2019, 4, 1))],
            vec![applicant("Jane", "Doe", "2019-05-01")],
        );
        assert!(linker.link().expect("link").is_empty());
    }

    #[test]
    fn duplicate_identities_yield_every_qualifying_pair() {
        let linker = linker(
            vec![
                performer("JANE", "DOE", (2020, 1, 1)),
                performer("jane", "doe ", (2021, 1, 1)),
                performer("JOHN", "SMITH", (2020, 1, 1)),
            ],
            vec![
                applicant("Jane", "Doe", "2019-05-01"),
                applicant("JANE", "DOE", "2020-06-01"),
                applicant("Jane", "Doe", ""),
            ],
        );
        let matches = linker.link().expect("link");
        // first performer pairs with the 2019 application; second with both dated ones
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn assessments_attach_by_applicant_id() {
        let linker = linker(
            vec![performer("JANE", "DOE", (2020, 1, 1))],
            vec![applicant("Jane", "Doe", "2019-05-01")],
        );
        let mut matches = linker.link().expect("link");
        let rows: Vec<ApplicantRow> = [
            vec![("applicant_id", "1001"), ("resume_only_score", "85.5")],
            vec![("applicant_id", "1001"), ("jakib_score", "78.5"), ("jakib_decision", "hire")],
            vec![("applicant_id", "2002"), ("jakib_score", "50")],
        ]
        .into_iter()
        .map(|pairs| {
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        })
        .collect();

        let attached = attach_assessments(&mut matches, &StaticAssessmentSource::new(rows))
            .expect("static source");
        assert_eq!(attached, 1);
        assert_eq!(matches[0].resume_score, Some(85.5));
        assert_eq!(matches[0].jakib_score, Some(78.5));
        assert_eq!(matches[0].jakib_recommendation.as_deref(), Some("hire"));
    }

    #[test]
    fn matches_export_with_header() {
        let linker = linker(
            vec![performer("JANE", "DOE", (2020, 1, 1))],
            vec![applicant("Jane", "Doe", "2019-05-01")],
        );
        let mut buffer = Vec::new();
        write_matches(&linker.link().expect("link"), &mut buffer).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.starts_with("agent_first_name,agent_last_name,applicant_id,application_date"));
        assert!(text.contains("JANE,DOE,1001,2019-05-01,2020-01-01"));
    }
}
