use super::mapping::SemanticColumn;
use super::semantic::{SemanticDataset, SemanticRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One row per (agent_name, first name, last name). Field names are the summary export's
/// column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPerformanceSummary {
    pub agent_name: String,
    pub agent_first_name: String,
    pub agent_last_name: String,
    pub days_worked: usize,
    pub first_performance_date: Option<NaiveDate>,
    pub last_performance_date: Option<NaiveDate>,
    pub total_interactions_period: Option<f64>,
    pub avg_daily_interactions: Option<f64>,
    pub talk_time_goal_met_mean: Option<f64>,
    pub hold_time_goal_met_mean: Option<f64>,
    pub acw_goal_met_mean: Option<f64>,
    pub aht_goal_met_mean: Option<f64>,
    pub overall_goal_achievement_rate: Option<f64>,
    pub perfect_days_rate: Option<f64>,
    pub avg_performance_score: Option<f64>,
    pub avg_hourly_rate: Option<f64>,
    pub talk_time_seconds_mean: Option<f64>,
    pub hold_time_seconds_mean: Option<f64>,
    pub after_call_work_seconds_mean: Option<f64>,
    pub average_handle_time_seconds_mean: Option<f64>,
    pub customer_satisfaction_score_mean: Option<f64>,
    pub first_call_resolution_rate_mean: Option<f64>,
    pub schedule_adherence_rate_mean: Option<f64>,
    pub avg_interactions_per_day: Option<f64>,
    pub composite_performance_score: Option<f64>,
    pub rank: Option<usize>,
}

impl AgentPerformanceSummary {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.agent_first_name, self.agent_last_name)
    }
}

/// Weighted ranking score: 40% goal achievement, 30% performance score (on a 0-100
/// scale), 20% hourly rate against 20 per hour, 10% handle time against 600 seconds.
/// Inputs outside their nominal ranges are not clamped.
pub fn composite_score(
    goal_achievement_rate: f64,
    avg_performance_score: f64,
    avg_hourly_rate: f64,
    avg_handle_time_secs: f64,
) -> f64 {
    goal_achievement_rate * 0.4
        + (avg_performance_score / 100.0) * 0.3
        + (avg_hourly_rate / 20.0) * 0.2
        + (1.0 - avg_handle_time_secs / 600.0) * 0.1
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|value| !value.is_nan()) {
            self.sum += value;
            self.count += 1;
        }
    }

    fn push_flag(&mut self, flag: Option<bool>) {
        self.push(flag.map(|met| if met { 1.0 } else { 0.0 }));
    }

    fn sum(&self) -> Option<f64> {
        (self.count > 0).then_some(self.sum)
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct AgentAccumulator {
    days_worked: usize,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    interactions: Mean,
    talk_goal: Mean,
    hold_goal: Mean,
    acw_goal: Mean,
    aht_goal: Mean,
    daily_goal_rate: Mean,
    perfect_days: Mean,
    performance_score: Mean,
    hourly_rate: Mean,
    talk: Mean,
    hold: Mean,
    acw: Mean,
    aht: Mean,
    satisfaction: Mean,
    resolution: Mean,
    adherence: Mean,
}

impl AgentAccumulator {
    fn push(&mut self, record: &SemanticRecord) {
        if let Some(date) = record.performance_date {
            self.days_worked += 1;
            self.first_date = Some(self.first_date.map_or(date, |first| first.min(date)));
            self.last_date = Some(self.last_date.map_or(date, |last| last.max(date)));
        }
        self.interactions
            .push(record.total_interactions.map(|count| count as f64));
        self.talk_goal.push_flag(record.talk_time_goal_met);
        self.hold_goal.push_flag(record.hold_time_goal_met);
        self.acw_goal.push_flag(record.acw_goal_met);
        self.aht_goal.push_flag(record.aht_goal_met);
        self.daily_goal_rate.push(record.daily_goals_met_rate);
        self.perfect_days.push_flag(record.all_time_goals_met);
        self.performance_score.push(record.overall_performance_score);
        self.hourly_rate.push(record.hourly_interaction_rate);
        self.talk.push(record.talk_time_seconds);
        self.hold.push(record.hold_time_seconds);
        self.acw.push(record.after_call_work_seconds);
        self.aht.push(record.average_handle_time_seconds);
        self.satisfaction.push(record.customer_satisfaction_score);
        self.resolution.push(record.first_call_resolution_rate);
        self.adherence.push(record.schedule_adherence_rate);
    }

    fn finish(self, key: (String, String, String)) -> AgentPerformanceSummary {
        let rounded = |value: Option<f64>| value.map(|value| round_to(value, 3));
        let (agent_name, agent_first_name, agent_last_name) = key;

        let total_interactions_period = rounded(self.interactions.sum());
        let overall_goal_achievement_rate = rounded(self.daily_goal_rate.mean());
        let avg_performance_score = rounded(self.performance_score.mean());
        let avg_hourly_rate = rounded(self.hourly_rate.mean());
        let average_handle_time_seconds_mean = rounded(self.aht.mean());

        let avg_interactions_per_day = match (total_interactions_period, self.days_worked) {
            (Some(total), days) if days > 0 => Some(round_to(total / days as f64, 1)),
            _ => None,
        };

        let composite_performance_score = match (
            overall_goal_achievement_rate,
            avg_performance_score,
            avg_hourly_rate,
            average_handle_time_seconds_mean,
        ) {
            (Some(goal_rate), Some(score), Some(hourly), Some(handle)) => Some(round_to(
                composite_score(goal_rate, score, hourly, handle),
                4,
            )),
            _ => None,
        };

        AgentPerformanceSummary {
            agent_name,
            agent_first_name,
            agent_last_name,
            days_worked: self.days_worked,
            first_performance_date: self.first_date,
            last_performance_date: self.last_date,
            total_interactions_period,
            avg_daily_interactions: rounded(self.interactions.mean()),
            talk_time_goal_met_mean: rounded(self.talk_goal.mean()),
            hold_time_goal_met_mean: rounded(self.hold_goal.mean()),
            acw_goal_met_mean: rounded(self.acw_goal.mean()),
            aht_goal_met_mean: rounded(self.aht_goal.mean()),
            overall_goal_achievement_rate,
            perfect_days_rate: rounded(self.perfect_days.mean()),
            avg_performance_score,
            avg_hourly_rate,
            talk_time_seconds_mean: rounded(self.talk.mean()),
            hold_time_seconds_mean: rounded(self.hold.mean()),
            after_call_work_seconds_mean: rounded(self.acw.mean()),
            average_handle_time_seconds_mean,
            customer_satisfaction_score_mean: rounded(self.satisfaction.mean()),
            first_call_resolution_rate_mean: rounded(self.resolution.mean()),
            schedule_adherence_rate_mean: rounded(self.adherence.mean()),
            avg_interactions_per_day,
            composite_performance_score,
            rank: None,
        }
    }
}

fn group_key(record: &SemanticRecord) -> Option<(String, String, String)> {
    Some((
        record.agent_name.clone()?,
        record.agent_first_name.clone()?,
        record.agent_last_name.clone()?,
    ))
}

/// Aggregator: one summary per agent, ordered by the grouping key. Records missing any
/// part of the key are left out.
pub fn aggregate(dataset: &SemanticDataset) -> Vec<AgentPerformanceSummary> {
    let mut groups: BTreeMap<(String, String, String), AgentAccumulator> = BTreeMap::new();
    let mut ungrouped = 0usize;

    for record in &dataset.records {
        match group_key(record) {
            Some(key) => groups.entry(key).or_default().push(record),
            None => ungrouped += 1,
        }
    }

    if ungrouped > 0 {
        warn!(
            rows = ungrouped,
            "rows without a complete agent identity excluded from aggregation"
        );
    }
    if !dataset.has(SemanticColumn::OverallPerformanceScore) {
        warn!("overall_performance_score absent; composite scores will be empty");
    }

    let summaries: Vec<AgentPerformanceSummary> = groups
        .into_iter()
        .map(|(key, accumulator)| accumulator.finish(key))
        .collect();

    info!(agents = summaries.len(), "calculated agent performance summaries");
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::performance::semantic::{SemanticSlot, TransformationLog};

    fn record(name: &str, first: &str, last: &str, day: u32) -> SemanticRecord {
        SemanticRecord {
            manager_name: None,
            location: None,
            supervisor_name: None,
            agent_name: Some(name.to_string()),
            agent_first_name: Some(first.to_string()),
            agent_last_name: Some(last.to_string()),
            agent_middle_initial: None,
            performance_year: Some(2025),
            performance_month: Some("January".to_string()),
            performance_day: Some(i64::from(day)),
            performance_date: NaiveDate::from_ymd_opt(2025, 1, day),
            day_of_week: None,
            week_of_year: None,
            is_weekend_day: None,
            talk_time_seconds: Some(250.0),
            hold_time_seconds: Some(8.0),
            after_call_work_seconds: Some(40.0),
            average_handle_time_seconds: Some(300.0),
            total_interactions: Some(40),
            customer_satisfaction_score: None,
            first_call_resolution_rate: Some(0.8),
            schedule_adherence_rate: Some(0.9),
            talk_time_availability_pct: None,
            off_phone_time_pct: None,
            paperless_conversion_rate: None,
            homeserve_transfer_count: None,
            allconnect_transfer_count: None,
            overall_performance_score: Some(85.0),
            hourly_interaction_rate: Some(12.0),
            talk_time_goal_met: Some(true),
            hold_time_goal_met: Some(true),
            acw_goal_met: Some(true),
            aht_goal_met: Some(true),
            daily_goals_met_rate: Some(1.0),
            all_time_goals_met: Some(true),
            performance_tier: None,
            high_volume_day: None,
            efficiency_category: None,
            processed_timestamp: NaiveDate::from_ymd_opt(2025, 2, 1)
                .and_then(|date| date.and_hms_opt(6, 0, 0))
                .expect("valid timestamp"),
            extras: Vec::new(),
        }
    }

    fn dataset(records: Vec<SemanticRecord>) -> SemanticDataset {
        SemanticDataset {
            layout: vec![SemanticSlot::Named(SemanticColumn::OverallPerformanceScore)],
            extra_labels: Vec::new(),
            records,
            log: TransformationLog::default(),
        }
    }

    #[test]
    fn composite_matches_worked_example() {
        let score = composite_score(0.9, 85.0, 12.0, 300.0);
        assert!((score - 0.785).abs() < 1e-9);
    }

    #[test]
    fn composite_is_not_clamped() {
        let score = composite_score(1.0, 100.0, 40.0, 0.0);
        assert!((score - 1.2).abs() < 1e-9);
    }

    #[test]
    fn groups_by_identity_and_summarizes() {
        let mut second_day = record("SMITH,JOHN A", "JOHN", "SMITH", 3);
        second_day.total_interactions = Some(20);
        second_day.talk_time_goal_met = Some(false);
        second_day.daily_goals_met_rate = Some(0.75);
        second_day.all_time_goals_met = Some(false);
        let mut undated = record("SMITH,JOHN A", "JOHN", "SMITH", 4);
        undated.performance_date = None;
        undated.total_interactions = None;
        let mut anonymous = record("UNKNOWN", "X", "Y", 5);
        anonymous.agent_first_name = None;

        let summaries = aggregate(&dataset(vec![
            record("SMITH,JOHN A", "JOHN", "SMITH", 2),
            second_day,
            undated,
            record("DOE,JANE", "JANE", "DOE", 2),
            anonymous,
        ]));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].agent_name, "DOE,JANE");
        let smith = &summaries[1];
        assert_eq!(smith.days_worked, 2);
        assert_eq!(smith.first_performance_date, NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(smith.last_performance_date, NaiveDate::from_ymd_opt(2025, 1, 3));
        assert_eq!(smith.total_interactions_period, Some(60.0));
        assert_eq!(smith.avg_daily_interactions, Some(30.0));
        assert_eq!(smith.avg_interactions_per_day, Some(30.0));
        assert_eq!(smith.talk_time_goal_met_mean, Some(0.667));
        assert_eq!(smith.overall_goal_achievement_rate, Some(0.917));
        assert_eq!(smith.perfect_days_rate, Some(0.667));
        assert_eq!(smith.rank, None);
        assert_eq!(smith.full_name(), "JOHN SMITH");
    }

    #[test]
    fn missing_score_leaves_composite_empty() {
        let mut unscored = record("DOE,JANE", "JANE", "DOE", 2);
        unscored.overall_performance_score = None;
        let summaries = aggregate(&dataset(vec![unscored]));
        assert_eq!(summaries[0].avg_performance_score, None);
        assert_eq!(summaries[0].composite_performance_score, None);
    }

    #[test]
    fn composite_uses_rounded_aggregates() {
        let summaries = aggregate(&dataset(vec![record("DOE,JANE", "JANE", "DOE", 2)]));
        // 0.4 + 0.255 + 0.12 + 0.05
        assert_eq!(summaries[0].composite_performance_score, Some(0.825));
    }
}
