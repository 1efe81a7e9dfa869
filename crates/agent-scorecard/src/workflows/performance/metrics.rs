use super::domain::{CleanedDataset, GoalFlags, PerformanceEvent};
use super::fields::Field;
use serde::Serialize;
use tracing::{info, warn};

const SCORE_INPUTS: [Field; 3] = [
    Field::TalkAvailablePct,
    Field::ResolutionRate,
    Field::Conformance,
];

/// Daily duration targets in seconds; a day meets a goal when the metric is at or below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalTargets {
    pub talk_secs: f64,
    pub hold_secs: f64,
    pub acw_secs: f64,
    pub aht_secs: f64,
}

impl Default for GoalTargets {
    fn default() -> Self {
        Self {
            talk_secs: 279.0,
            hold_secs: 10.0,
            acw_secs: 41.0,
            aht_secs: 330.0,
        }
    }
}

impl GoalTargets {
    pub fn evaluate(&self, event: &PerformanceEvent) -> GoalFlags {
        GoalFlags {
            talk: event.talk.map(|secs| secs <= self.talk_secs),
            hold: event.hold.map(|secs| secs <= self.hold_secs),
            acw: event.acw.map(|secs| secs <= self.acw_secs),
            aht: event.aht.map(|secs| secs <= self.aht_secs),
        }
    }
}

/// Weighted daily score: 30% availability, 40% resolution, 30% adherence.
pub fn performance_score(availability: f64, resolution_rate: f64, adherence: f64) -> f64 {
    availability * 0.3 + resolution_rate * 0.4 + adherence * 0.3
}

/// Interactions per hour implied by the average handle time; zero when the handle time
/// is not a usable positive number.
pub fn calls_per_hour(handle_time_secs: f64) -> f64 {
    if handle_time_secs > 0.0 && handle_time_secs.is_finite() {
        let rate = 3600.0 / handle_time_secs;
        if rate.is_finite() {
            return rate;
        }
    }
    0.0
}

/// Metric Calculator. Each derivation runs only when its source columns exist in the
/// dataset; absent inputs leave the derived column out entirely.
pub fn enrich(mut dataset: CleanedDataset, goals: &GoalTargets) -> CleanedDataset {
    let with_score = dataset.columns.contains_all(&SCORE_INPUTS);
    let with_rate = dataset
        .columns
        .contains_all(&[Field::InteractionCount, Field::Aht]);

    for event in &mut dataset.events {
        if with_score {
            event.performance_score = match (
                event.talk_available,
                event.resolution_rate,
                event.conformance,
            ) {
                (Some(availability), Some(resolution), Some(adherence)) => {
                    Some(performance_score(availability, resolution, adherence))
                }
                _ => None,
            };
        }
        if with_rate {
            event.calls_per_hour = Some(event.aht.map(calls_per_hour).unwrap_or(0.0));
        }
        event.goals = goals.evaluate(event);
    }

    if with_score {
        dataset.columns.insert(Field::PerformanceScore);
    } else {
        warn!("performance_score skipped: availability, resolution or conformance column absent");
    }
    if with_rate {
        dataset.columns.insert(Field::CallsPerHour);
    }

    let goal_columns = [
        (Field::Talk, Field::TalkTimeGoalMet),
        (Field::Hold, Field::HoldTimeGoalMet),
        (Field::Acw, Field::AcwGoalMet),
        (Field::Aht, Field::AhtGoalMet),
    ];
    let mut any_goal = false;
    for (source, flag) in goal_columns {
        if dataset.columns.contains(source) {
            dataset.columns.insert(flag);
            any_goal = true;
        }
    }
    if any_goal {
        dataset.columns.insert(Field::DailyGoalsMetRate);
        dataset.columns.insert(Field::AllTimeGoalsMet);
    }

    info!(
        performance_score = with_score,
        calls_per_hour = with_rate,
        "added calculated metrics"
    );

    dataset
}
