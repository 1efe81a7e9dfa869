use super::domain::{recommends_hire, MatchedCandidate};
use crate::workflows::performance::{median, round_to};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientCount {
    pub client: String,
    pub matches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Resume scores among matches that have one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeInsights {
    pub scored: usize,
    pub avg_score: Option<f64>,
    /// Mean resume score of matches whose performance is above the 80th percentile.
    pub high_performers_avg_score: Option<f64>,
    pub education_distribution: Vec<LabelCount>,
}

/// How often a hire recommendation agreed with at-or-above-median performance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionAccuracy {
    pub success_threshold: Option<f64>,
    pub overall_accuracy: f64,
    pub successful_predictions: usize,
    pub total_predictions: usize,
}

/// AI assessment scores among matches that have one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentInsights {
    pub assessed: usize,
    pub avg_score: Option<f64>,
    pub recommendation_distribution: Vec<LabelCount>,
    pub prediction_accuracy: PredictionAccuracy,
}

/// Summary of a linkage run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkageInsights {
    pub total_matches: usize,
    pub unique_clients: usize,
    pub earliest_application: Option<NaiveDate>,
    pub latest_application: Option<NaiveDate>,
    pub avg_performance_score: Option<f64>,
    /// 80th percentile of matched performers' average score.
    pub top_performer_threshold: Option<f64>,
    pub avg_calls_per_hour: Option<f64>,
    pub client_distribution: Vec<ClientCount>,
    pub avg_years_to_first_performance: Option<f64>,
    pub min_years_to_first_performance: Option<i32>,
    pub max_years_to_first_performance: Option<i32>,
    pub resume: Option<ResumeInsights>,
    pub assessment: Option<AssessmentInsights>,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolation quantile over the given values.
pub(crate) fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Occurrences per label, most frequent first, ties by label.
fn count_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut distribution: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.label.cmp(&right.label))
    });
    distribution
}

fn resume_insights(matches: &[MatchedCandidate]) -> Option<ResumeInsights> {
    let scored: Vec<&MatchedCandidate> = matches
        .iter()
        .filter(|candidate| candidate.resume_score.is_some())
        .collect();
    if scored.is_empty() {
        return None;
    }

    let resume_scores: Vec<f64> = scored.iter().filter_map(|c| c.resume_score).collect();
    let performance: Vec<f64> = scored
        .iter()
        .filter_map(|c| c.avg_performance_score)
        .collect();
    let high_bar = quantile(&performance, 0.8);
    let high_performers: Vec<f64> = scored
        .iter()
        .filter(|c| {
            c.avg_performance_score
                .zip(high_bar)
                .is_some_and(|(score, bar)| score > bar)
        })
        .filter_map(|c| c.resume_score)
        .collect();

    Some(ResumeInsights {
        scored: scored.len(),
        avg_score: mean(&resume_scores).map(|value| round_to(value, 2)),
        high_performers_avg_score: mean(&high_performers).map(|value| round_to(value, 2)),
        education_distribution: count_labels(
            scored.iter().filter_map(|c| c.resume_education.as_deref()),
        ),
    })
}

fn prediction_accuracy(assessed: &[&MatchedCandidate]) -> PredictionAccuracy {
    let success_threshold = median(assessed.iter().filter_map(|c| c.avg_performance_score));
    let successful_predictions = assessed
        .iter()
        .filter(|c| {
            let actual = c
                .avg_performance_score
                .zip(success_threshold)
                .is_some_and(|(score, threshold)| score >= threshold);
            let predicted = c
                .jakib_recommendation
                .as_deref()
                .is_some_and(recommends_hire);
            actual == predicted
        })
        .count();
    let total_predictions = assessed.len();

    PredictionAccuracy {
        success_threshold,
        overall_accuracy: if total_predictions == 0 {
            0.0
        } else {
            round_to(successful_predictions as f64 / total_predictions as f64, 3)
        },
        successful_predictions,
        total_predictions,
    }
}

fn assessment_insights(matches: &[MatchedCandidate]) -> Option<AssessmentInsights> {
    let assessed: Vec<&MatchedCandidate> = matches
        .iter()
        .filter(|candidate| candidate.jakib_score.is_some())
        .collect();
    if assessed.is_empty() {
        return None;
    }
    let scores: Vec<f64> = assessed.iter().filter_map(|c| c.jakib_score).collect();

    Some(AssessmentInsights {
        assessed: assessed.len(),
        avg_score: mean(&scores).map(|value| round_to(value, 2)),
        recommendation_distribution: count_labels(
            assessed
                .iter()
                .filter_map(|c| c.jakib_recommendation.as_deref()),
        ),
        prediction_accuracy: prediction_accuracy(&assessed),
    })
}

pub fn generate_insights(matches: &[MatchedCandidate]) -> LinkageInsights {
    let scores: Vec<f64> = matches
        .iter()
        .filter_map(|candidate| candidate.avg_performance_score)
        .collect();
    let rates: Vec<f64> = matches
        .iter()
        .filter_map(|candidate| candidate.avg_calls_per_hour)
        .collect();
    let years: Vec<i32> = matches
        .iter()
        .map(|candidate| candidate.years_since_application)
        .collect();

    let client_distribution: Vec<ClientCount> = count_labels(
        matches
            .iter()
            .filter_map(|candidate| candidate.client_name.as_deref()),
    )
    .into_iter()
    .map(|entry| ClientCount {
        client: entry.label,
        matches: entry.count,
    })
    .collect();

    let year_values: Vec<f64> = years.iter().map(|year| f64::from(*year)).collect();

    LinkageInsights {
        total_matches: matches.len(),
        unique_clients: client_distribution.len(),
        earliest_application: matches.iter().map(|candidate| candidate.application_date).min(),
        latest_application: matches.iter().map(|candidate| candidate.application_date).max(),
        avg_performance_score: mean(&scores).map(|value| round_to(value, 2)),
        top_performer_threshold: quantile(&scores, 0.8).map(|value| round_to(value, 2)),
        avg_calls_per_hour: mean(&rates).map(|value| round_to(value, 2)),
        client_distribution,
        avg_years_to_first_performance: mean(&year_values).map(|value| round_to(value, 1)),
        min_years_to_first_performance: years.iter().copied().min(),
        max_years_to_first_performance: years.iter().copied().max(),
        resume: resume_insights(matches),
        assessment: assessment_insights(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(client: &str, score: f64, applied: (i32, u32, u32)) -> MatchedCandidate {
        let application_date =
            NaiveDate::from_ymd_opt(applied.0, applied.1, applied.2).expect("date");
        let first_performance_date = NaiveDate::from_ymd_opt(2021, 3, 1).expect("date");
        MatchedCandidate {
            agent_first_name: "JANE".to_string(),
            agent_last_name: "DOE".to_string(),
            applicant_id: Some(1),
            application_date,
            first_performance_date,
            avg_performance_score: Some(score),
            max_performance_score: None,
            performance_records_count: 10,
            avg_calls_per_hour: Some(10.0),
            client_id: None,
            client_name: Some(client.to_string()),
            email: None,
            years_since_application: 2021 - applied.0,
            resume_score: None,
            resume_education: None,
            jakib_score: None,
            jakib_recommendation: None,
        }
    }

    fn assessed(score: f64, jakib: f64, recommendation: &str) -> MatchedCandidate {
        MatchedCandidate {
            jakib_score: Some(jakib),
            jakib_recommendation: Some(recommendation.to_string()),
            ..candidate("AEP", score, (2019, 5, 1))
        }
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let value = quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.8).expect("quantile");
        assert!((value - 4.2).abs() < 1e-9);
        assert_eq!(quantile(&[7.0], 0.8), Some(7.0));
        assert_eq!(quantile(&[], 0.8), None);
    }

    #[test]
    fn insights_summarize_matches() {
        let matches = vec![
            candidate("AEP", 80.0, (2019, 5, 1)),
            candidate("AEP Energy", 90.0, (2016, 1, 26)),
            candidate("AEP", 70.0, (2020, 2, 3)),
        ];
        let insights = generate_insights(&matches);
        assert_eq!(insights.total_matches, 3);
        assert_eq!(insights.unique_clients, 2);
        assert_eq!(insights.earliest_application, NaiveDate::from_ymd_opt(2016, 1, 26));
        assert_eq!(insights.latest_application, NaiveDate::from_ymd_opt(2020, 2, 3));
        assert_eq!(insights.avg_performance_score, Some(80.0));
        assert_eq!(insights.top_performer_threshold, Some(86.0));
        assert_eq!(insights.client_distribution[0].client, "AEP");
        assert_eq!(insights.client_distribution[0].matches, 2);
        assert_eq!(insights.avg_years_to_first_performance, Some(2.7));
        assert_eq!(insights.min_years_to_first_performance, Some(1));
        assert_eq!(insights.max_years_to_first_performance, Some(5));
        assert!(insights.resume.is_none());
        assert!(insights.assessment.is_none());
    }

    #[test]
    fn prediction_accuracy_uses_median_performance() {
        let matches = vec![
            assessed(92.0, 88.0, "strong_hire"),
            assessed(85.0, 79.0, "hire"),
            assessed(70.0, 81.0, "hire"),
            assessed(60.0, 40.0, "no_hire"),
            candidate("AEP", 99.0, (2019, 5, 1)),
        ];
        let assessment = generate_insights(&matches)
            .assessment
            .expect("assessment block");

        assert_eq!(assessment.assessed, 4);
        assert_eq!(assessment.avg_score, Some(72.0));
        assert_eq!(assessment.recommendation_distribution[0].label, "hire");
        assert_eq!(assessment.recommendation_distribution[0].count, 2);
        let accuracy = assessment.prediction_accuracy;
        assert_eq!(accuracy.success_threshold, Some(77.5));
        assert_eq!(accuracy.successful_predictions, 3);
        assert_eq!(accuracy.total_predictions, 4);
        assert_eq!(accuracy.overall_accuracy, 0.75);
    }

    #[test]
    fn resume_insights_compare_high_performers() {
        let resume = |score: f64, resume: f64, education: &str| MatchedCandidate {
            resume_score: Some(resume),
            resume_education: Some(education.to_string()),
            ..candidate("AEP", score, (2019, 5, 1))
        };
        let matches = vec![
            resume(60.0, 70.0, "High School"),
            resume(70.0, 80.0, "Some College"),
            resume(80.0, 75.0, "High School"),
            resume(90.0, 90.0, "Bachelor's Degree"),
            resume(95.0, 95.0, "Bachelor's Degree"),
        ];
        let insights = generate_insights(&matches).resume.expect("resume block");
        assert_eq!(insights.scored, 5);
        assert_eq!(insights.avg_score, Some(82.0));
        // 80th percentile of performance is 91.0, so only the 95.0 performer counts
        assert_eq!(insights.high_performers_avg_score, Some(95.0));
        assert_eq!(insights.education_distribution[0].label, "Bachelor's Degree");
        assert_eq!(insights.education_distribution[0].count, 2);
    }

    #[test]
    fn empty_matches_yield_empty_insights() {
        let insights = generate_insights(&[]);
        assert_eq!(insights.total_matches, 0);
        assert_eq!(insights.avg_performance_score, None);
        assert!(insights.client_distribution.is_empty());
    }
}
