use crate::workflows::performance::{AgentPerformanceSummary, PerformanceEvent};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A row returned by an applicant source, keyed by column name.
pub type ApplicantRow = BTreeMap<String, String>;

/// Join key: trimmed, uppercased first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey {
    pub first: String,
    pub last: String,
}

impl NameKey {
    pub fn new(first: &str, last: &str) -> Option<Self> {
        let first = first.trim().to_uppercase();
        let last = last.trim().to_uppercase();
        if first.is_empty() || last.is_empty() {
            return None;
        }
        Some(Self { first, last })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantRecord {
    pub applicant_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub requisition_position: Option<String>,
}

impl ApplicantRecord {
    /// Builds a record from a source row. Rows without a usable first and last name
    /// are rejected.
    pub fn from_row(row: &ApplicantRow) -> Option<Self> {
        let field = |key: &str| {
            row.get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };
        let first_name = field("first_name")?.to_string();
        let last_name = field("last_name")?.to_string();

        Some(Self {
            applicant_id: field("applicant_id").and_then(parse_id),
            first_name,
            last_name,
            email: field("email").map(str::to_string),
            application_date: field("application_date")
                .and_then(parse_datetime)
                .map(|dt| dt.date()),
            client_id: field("client_id").and_then(parse_id),
            client_name: field("client_name").map(str::to_string),
            requisition_position: field("requisition_position").map(str::to_string),
        })
    }

    pub fn key(&self) -> Option<NameKey> {
        NameKey::new(&self.first_name, &self.last_name)
    }
}

fn parse_id(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|id| id.fract() == 0.0).map(|id| id as i64))
}

/// Accepts RFC 3339 timestamps (kept at their own wall-clock time), SQL-style `YYYY-MM-DD HH:MM:SS` and bare dates.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

/// Screening results for one applicant: the resume score and the AI interview assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssessmentRecord {
    pub applicant_id: i64,
    pub resume_score: Option<f64>,
    pub resume_education: Option<String>,
    pub jakib_score: Option<f64>,
    pub jakib_recommendation: Option<String>,
}

impl AssessmentRecord {
    /// Builds a record from a source row. A row may carry only the resume half or only
    /// the assessment half; rows without an applicant id are rejected.
    pub fn from_row(row: &ApplicantRow) -> Option<Self> {
        let field = |keys: &[&str]| {
            keys.iter().find_map(|key| {
                row.get(*key)
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
            })
        };
        let score = |keys: &[&str]| {
            field(keys)
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };

        Some(Self {
            applicant_id: field(&["applicant_id"]).and_then(parse_id)?,
            resume_score: score(&["resume_only_score", "resume_score"]),
            resume_education: field(&["resume_only_education", "resume_education"])
                .map(str::to_string),
            jakib_score: score(&["jakib_score"]),
            jakib_recommendation: field(&["jakib_decision", "jakib_recommendation"])
                .map(str::to_string),
        })
    }

    /// Fills fields this record lacks from another record for the same applicant.
    pub(crate) fn merge(&mut self, other: AssessmentRecord) {
        self.resume_score = self.resume_score.or(other.resume_score);
        self.resume_education = self.resume_education.take().or(other.resume_education);
        self.jakib_score = self.jakib_score.or(other.jakib_score);
        self.jakib_recommendation = self
            .jakib_recommendation
            .take()
            .or(other.jakib_recommendation);
    }
}

/// Whether an assessment recommendation counts as a predicted successful hire.
pub fn recommends_hire(recommendation: &str) -> bool {
    matches!(
        recommendation.trim().to_ascii_lowercase().as_str(),
        "hire" | "strong_hire"
    )
}

/// Performer side of the join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformerProfile {
    pub first_name: String,
    pub last_name: String,
    pub first_performance_date: Option<NaiveDate>,
    pub avg_performance_score: Option<f64>,
    pub max_performance_score: Option<f64>,
    pub performance_records_count: usize,
    pub avg_calls_per_hour: Option<f64>,
}

impl PerformerProfile {
    pub fn key(&self) -> Option<NameKey> {
        NameKey::new(&self.first_name, &self.last_name)
    }

    pub fn from_summary(summary: &AgentPerformanceSummary) -> Self {
        Self {
            first_name: summary.agent_first_name.clone(),
            last_name: summary.agent_last_name.clone(),
            first_performance_date: summary.first_performance_date,
            avg_performance_score: summary.avg_performance_score,
            max_performance_score: None,
            performance_records_count: summary.days_worked,
            avg_calls_per_hour: summary.avg_hourly_rate,
        }
    }

    /// One profile per (first, last) pair among cleaned events, ordered by name. Events
    /// without both name parts are skipped.
    pub fn from_events(events: &[PerformanceEvent]) -> Vec<Self> {
        #[derive(Default)]
        struct Accumulator {
            first_date: Option<NaiveDate>,
            score_sum: f64,
            score_max: Option<f64>,
            score_count: usize,
            rate_sum: f64,
            rate_count: usize,
        }

        let mut groups: BTreeMap<(String, String), Accumulator> = BTreeMap::new();
        for event in events {
            let (Some(first), Some(last)) = (&event.name.first, &event.name.last) else {
                continue;
            };
            let entry = groups.entry((first.clone(), last.clone())).or_default();
            if let Some(date) = event.date {
                entry.first_date = Some(entry.first_date.map_or(date, |current| current.min(date)));
            }
            if let Some(score) = event.performance_score.filter(|score| !score.is_nan()) {
                entry.score_sum += score;
                entry.score_count += 1;
                entry.score_max = Some(entry.score_max.map_or(score, |max| max.max(score)));
            }
            if let Some(rate) = event.calls_per_hour.filter(|rate| !rate.is_nan()) {
                entry.rate_sum += rate;
                entry.rate_count += 1;
            }
        }

        let round4 = |value: f64| (value * 10_000.0).round() / 10_000.0;
        groups
            .into_iter()
            .map(|((first_name, last_name), acc)| Self {
                first_name,
                last_name,
                first_performance_date: acc.first_date,
                avg_performance_score: (acc.score_count > 0)
                    .then(|| round4(acc.score_sum / acc.score_count as f64)),
                max_performance_score: acc.score_max.map(round4),
                performance_records_count: acc.score_count,
                avg_calls_per_hour: (acc.rate_count > 0)
                    .then(|| round4(acc.rate_sum / acc.rate_count as f64)),
            })
            .collect()
    }
}

/// A performer joined to an application submitted before their first performance day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedCandidate {
    pub agent_first_name: String,
    pub agent_last_name: String,
    pub applicant_id: Option<i64>,
    pub application_date: NaiveDate,
    pub first_performance_date: NaiveDate,
    pub avg_performance_score: Option<f64>,
    pub max_performance_score: Option<f64>,
    pub performance_records_count: usize,
    pub avg_calls_per_hour: Option<f64>,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub email: Option<String>,
    pub years_since_application: i32,
    pub resume_score: Option<f64>,
    pub resume_education: Option<String>,
    pub jakib_score: Option<f64>,
    pub jakib_recommendation: Option<String>,
}

impl MatchedCandidate {
    pub(crate) fn pair(performer: &PerformerProfile, applicant: &ApplicantRecord) -> Option<Self> {
        let first_performance_date = performer.first_performance_date?;
        let application_date = applicant.application_date?;
        if application_date >= first_performance_date {
            return None;
        }

        Some(Self {
            agent_first_name: performer.first_name.clone(),
            agent_last_name: performer.last_name.clone(),
            applicant_id: applicant.applicant_id,
            application_date,
            first_performance_date,
            avg_performance_score: performer.avg_performance_score,
            max_performance_score: performer.max_performance_score,
            performance_records_count: performer.performance_records_count,
            avg_calls_per_hour: performer.avg_calls_per_hour,
            client_id: applicant.client_id,
            client_name: applicant.client_name.clone(),
            email: applicant.email.clone(),
            years_since_application: first_performance_date.year() - application_date.year(),
            resume_score: None,
            resume_education: None,
            jakib_score: None,
            jakib_recommendation: None,
        })
    }

    pub(crate) fn apply_assessment(&mut self, assessment: &AssessmentRecord) {
        self.resume_score = assessment.resume_score;
        self.resume_education = assessment.resume_education.clone();
        self.jakib_score = assessment.jakib_score;
        self.jakib_recommendation = assessment.jakib_recommendation.clone();
    }
}

/// Applicants grouped by join key, preserving source order within a key.
pub(crate) fn index_applicants(applicants: &[ApplicantRecord]) -> HashMap<NameKey, Vec<&ApplicantRecord>> {
    let mut index: HashMap<NameKey, Vec<&ApplicantRecord>> = HashMap::new();
    for applicant in applicants {
        if let Some(key) = applicant.key() {
            index.entry(key).or_default().push(applicant);
        }
    }
    index
}
