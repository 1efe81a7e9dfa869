use super::domain::{CleanedDataset, PerformanceEvent};
use super::fields::Cell;
use super::mapping::{SemanticColumn, CRITICAL_COLUMNS, PASSTHROUGH, RATIO_COLUMNS, SEMANTIC_MAPPING};
use super::parser::parse_number;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

/// Ordinal bucket of the daily performance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PerformanceTier {
    #[serde(rename = "Needs_Improvement")]
    NeedsImprovement,
    #[serde(rename = "Meets_Expectations")]
    MeetsExpectations,
    #[serde(rename = "Exceeds_Expectations")]
    ExceedsExpectations,
    Outstanding,
}

impl PerformanceTier {
    /// Lower-closed partition of `[0, 100]` with edges 0, 60, 75, 90, 100.
    pub fn from_score(score: f64) -> Option<Self> {
        if !(0.0..=100.0).contains(&score) {
            return None;
        }
        Some(if score < 60.0 {
            Self::NeedsImprovement
        } else if score < 75.0 {
            Self::MeetsExpectations
        } else if score < 90.0 {
            Self::ExceedsExpectations
        } else {
            Self::Outstanding
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NeedsImprovement => "Needs_Improvement",
            Self::MeetsExpectations => "Meets_Expectations",
            Self::ExceedsExpectations => "Exceeds_Expectations",
            Self::Outstanding => "Outstanding",
        }
    }
}

/// Ordinal bucket of the hourly interaction rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EfficiencyCategory {
    Low,
    Medium,
    High,
    #[serde(rename = "Very_High")]
    VeryHigh,
}

impl EfficiencyCategory {
    /// Lower-closed buckets with edges 0, 5, 10, 15 and an open top.
    pub fn from_rate(rate: f64) -> Option<Self> {
        if rate.is_nan() || rate < 0.0 {
            return None;
        }
        Some(if rate < 5.0 {
            Self::Low
        } else if rate < 10.0 {
            Self::Medium
        } else if rate < 15.0 {
            Self::High
        } else {
            Self::VeryHigh
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very_High",
        }
    }
}

/// One event in the public vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticRecord {
    pub manager_name: Option<String>,
    pub location: Option<String>,
    pub supervisor_name: Option<String>,
    pub agent_name: Option<String>,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    pub agent_middle_initial: Option<String>,
    pub performance_year: Option<i64>,
    pub performance_month: Option<String>,
    pub performance_day: Option<i64>,
    pub performance_date: Option<NaiveDate>,
    pub day_of_week: Option<&'static str>,
    pub week_of_year: Option<i64>,
    pub is_weekend_day: Option<bool>,
    pub talk_time_seconds: Option<f64>,
    pub hold_time_seconds: Option<f64>,
    pub after_call_work_seconds: Option<f64>,
    pub average_handle_time_seconds: Option<f64>,
    pub total_interactions: Option<i64>,
    pub customer_satisfaction_score: Option<f64>,
    pub first_call_resolution_rate: Option<f64>,
    pub schedule_adherence_rate: Option<f64>,
    pub talk_time_availability_pct: Option<f64>,
    pub off_phone_time_pct: Option<f64>,
    pub paperless_conversion_rate: Option<f64>,
    pub homeserve_transfer_count: Option<i64>,
    pub allconnect_transfer_count: Option<i64>,
    pub overall_performance_score: Option<f64>,
    pub hourly_interaction_rate: Option<f64>,
    pub talk_time_goal_met: Option<bool>,
    pub hold_time_goal_met: Option<bool>,
    pub acw_goal_met: Option<bool>,
    pub aht_goal_met: Option<bool>,
    pub daily_goals_met_rate: Option<f64>,
    pub all_time_goals_met: Option<bool>,
    pub performance_tier: Option<PerformanceTier>,
    pub high_volume_day: Option<bool>,
    pub efficiency_category: Option<EfficiencyCategory>,
    pub processed_timestamp: NaiveDateTime,
    pub extras: Vec<Cell>,
}

impl SemanticRecord {
    fn from_event(event: &PerformanceEvent, processed_timestamp: NaiveDateTime) -> Self {
        Self {
            manager_name: event.manager.clone(),
            location: event.location.clone(),
            supervisor_name: event.supervisor.clone(),
            agent_name: event.agent_name.clone(),
            agent_first_name: event.name.first.clone(),
            agent_last_name: event.name.last.clone(),
            agent_middle_initial: event.name.middle_initial.clone(),
            performance_year: round_whole(event.date_year.as_deref().and_then(text_number)),
            performance_month: event.date_month.clone(),
            performance_day: round_whole(event.date_day.as_deref().and_then(text_number)),
            performance_date: event.date,
            day_of_week: event.weekday(),
            week_of_year: event.week_number(),
            is_weekend_day: event.is_weekend(),
            talk_time_seconds: event.talk,
            hold_time_seconds: event.hold,
            after_call_work_seconds: event.acw,
            average_handle_time_seconds: event.aht,
            total_interactions: round_whole(event.interaction_count),
            customer_satisfaction_score: event.osat_with_agent,
            first_call_resolution_rate: event.resolution_rate,
            schedule_adherence_rate: event.conformance,
            talk_time_availability_pct: event.talk_available,
            off_phone_time_pct: event.off_phone,
            paperless_conversion_rate: event.paperless_conversion,
            homeserve_transfer_count: round_whole(event.homeserve_transfers),
            allconnect_transfer_count: round_whole(event.allconnect_transfers),
            overall_performance_score: event.performance_score,
            hourly_interaction_rate: event.calls_per_hour,
            talk_time_goal_met: event.goals.talk,
            hold_time_goal_met: event.goals.hold,
            acw_goal_met: event.goals.acw,
            aht_goal_met: event.goals.aht,
            daily_goals_met_rate: event.goals.daily_rate(),
            all_time_goals_met: event.goals.all_met(),
            performance_tier: None,
            high_volume_day: None,
            efficiency_category: None,
            processed_timestamp,
            extras: event.extras.clone(),
        }
    }

    pub fn cell(&self, column: SemanticColumn) -> Cell {
        use SemanticColumn as C;
        match column {
            C::ManagerName => self.manager_name.clone().into(),
            C::Location => self.location.clone().into(),
            C::SupervisorName => self.supervisor_name.clone().into(),
            C::AgentName => self.agent_name.clone().into(),
            C::AgentFirstName => self.agent_first_name.clone().into(),
            C::AgentLastName => self.agent_last_name.clone().into(),
            C::AgentMiddleInitial => self.agent_middle_initial.clone().into(),
            C::PerformanceYear => self.performance_year.into(),
            C::PerformanceMonth => self.performance_month.clone().into(),
            C::PerformanceDay => self.performance_day.into(),
            C::PerformanceDate => self.performance_date.into(),
            C::DayOfWeek => self.day_of_week.into(),
            C::WeekOfYear => self.week_of_year.into(),
            C::IsWeekendDay => self.is_weekend_day.into(),
            C::TalkTimeSeconds => self.talk_time_seconds.into(),
            C::HoldTimeSeconds => self.hold_time_seconds.into(),
            C::AfterCallWorkSeconds => self.after_call_work_seconds.into(),
            C::AverageHandleTimeSeconds => self.average_handle_time_seconds.into(),
            C::TotalInteractions => self.total_interactions.into(),
            C::CustomerSatisfactionScore => self.customer_satisfaction_score.into(),
            C::FirstCallResolutionRate => self.first_call_resolution_rate.into(),
            C::ScheduleAdherenceRate => self.schedule_adherence_rate.into(),
            C::TalkTimeAvailabilityPct => self.talk_time_availability_pct.into(),
            C::OffPhoneTimePct => self.off_phone_time_pct.into(),
            C::PaperlessConversionRate => self.paperless_conversion_rate.into(),
            C::HomeserveTransferCount => self.homeserve_transfer_count.into(),
            C::AllconnectTransferCount => self.allconnect_transfer_count.into(),
            C::OverallPerformanceScore => self.overall_performance_score.into(),
            C::HourlyInteractionRate => self.hourly_interaction_rate.into(),
            C::TalkTimeGoalMet => self.talk_time_goal_met.into(),
            C::HoldTimeGoalMet => self.hold_time_goal_met.into(),
            C::AcwGoalMet => self.acw_goal_met.into(),
            C::AhtGoalMet => self.aht_goal_met.into(),
            C::DailyGoalsMetRate => self.daily_goals_met_rate.into(),
            C::AllTimeGoalsMet => self.all_time_goals_met.into(),
            C::PerformanceTier => self.performance_tier.map(PerformanceTier::label).into(),
            C::HighVolumeDay => self.high_volume_day.into(),
            C::EfficiencyCategory => self
                .efficiency_category
                .map(EfficiencyCategory::label)
                .into(),
            C::ProcessedTimestamp => Cell::Text(
                self.processed_timestamp
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
        }
    }

    fn ratio_mut(&mut self, column: SemanticColumn) -> Option<&mut Option<f64>> {
        use SemanticColumn as C;
        Some(match column {
            C::TalkTimeAvailabilityPct => &mut self.talk_time_availability_pct,
            C::OffPhoneTimePct => &mut self.off_phone_time_pct,
            C::PaperlessConversionRate => &mut self.paperless_conversion_rate,
            C::FirstCallResolutionRate => &mut self.first_call_resolution_rate,
            C::ScheduleAdherenceRate => &mut self.schedule_adherence_rate,
            C::CustomerSatisfactionScore => &mut self.customer_satisfaction_score,
            _ => return None,
        })
    }
}

fn text_number(value: &str) -> Option<f64> {
    parse_number(value, false)
}

fn round_whole(value: Option<f64>) -> Option<i64> {
    value
        .filter(|number| number.is_finite())
        .map(|number| number.round() as i64)
}

/// Position in the semantic export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticSlot {
    Named(SemanticColumn),
    Extra(usize),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub date_sample: Vec<NaiveDate>,
    pub missing_critical_columns: Vec<String>,
}

/// Record of what the semantic transformation did, written next to its export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformationLog {
    pub mappings_applied: Vec<(String, String)>,
    pub missing_columns: Vec<String>,
    pub steps: Vec<String>,
    pub validation: ValidationSummary,
}

#[derive(Debug, Clone)]
pub struct SemanticDataset {
    pub layout: Vec<SemanticSlot>,
    pub extra_labels: Vec<String>,
    pub records: Vec<SemanticRecord>,
    pub log: TransformationLog,
}

impl SemanticDataset {
    pub fn has(&self, column: SemanticColumn) -> bool {
        self.layout.contains(&SemanticSlot::Named(column))
    }

    pub fn header(&self) -> Vec<&str> {
        self.layout
            .iter()
            .map(|slot| match slot {
                SemanticSlot::Named(column) => column.name(),
                SemanticSlot::Extra(index) => self.extra_labels[*index].as_str(),
            })
            .collect()
    }

    pub fn cell(&self, record: &SemanticRecord, slot: SemanticSlot) -> Cell {
        match slot {
            SemanticSlot::Named(column) => record.cell(column),
            SemanticSlot::Extra(index) => record.extras.get(index).cloned().unwrap_or(Cell::Null),
        }
    }
}

/// Semantic Renamer: projects the cleaned dataset onto the public schema, adds the
/// business columns, then standardizes ratio and integer types.
pub fn transform(cleaned: &CleanedDataset, processed_at: NaiveDateTime) -> SemanticDataset {
    let mut log = TransformationLog::default();
    let mut layout = Vec::new();

    for (field, column) in SEMANTIC_MAPPING {
        if cleaned.columns.contains(*field) {
            layout.push(SemanticSlot::Named(*column));
            log.mappings_applied
                .push((field.label().to_string(), column.name().to_string()));
        } else {
            log.missing_columns.push(field.label().to_string());
        }
    }
    log.steps
        .push(format!("Column mappings: {} defined", SEMANTIC_MAPPING.len()));
    if !log.missing_columns.is_empty() {
        warn!(missing = ?log.missing_columns, "columns not found in data");
        log.steps
            .push(format!("Missing columns: {}", log.missing_columns.join(", ")));
    }
    log.steps
        .push(format!("Columns renamed: {}", log.mappings_applied.len()));

    for (field, column) in PASSTHROUGH {
        if cleaned.columns.contains(*field) {
            layout.push(SemanticSlot::Named(*column));
        }
    }
    layout.extend((0..cleaned.extra_labels.len()).map(SemanticSlot::Extra));

    let mut records: Vec<SemanticRecord> = cleaned
        .events
        .iter()
        .map(|event| SemanticRecord::from_event(event, processed_at))
        .collect();

    let has = |column: SemanticColumn| layout.contains(&SemanticSlot::Named(column));
    let with_tier = has(SemanticColumn::OverallPerformanceScore);
    let with_volume = has(SemanticColumn::TotalInteractions);
    let with_efficiency = has(SemanticColumn::HourlyInteractionRate);

    let volume_threshold = if with_volume {
        median(cleaned.events.iter().filter_map(|event| event.interaction_count))
    } else {
        None
    };

    for (record, event) in records.iter_mut().zip(&cleaned.events) {
        if with_tier {
            record.performance_tier = record
                .overall_performance_score
                .and_then(PerformanceTier::from_score);
        }
        if let Some(threshold) = volume_threshold {
            record.high_volume_day = event.interaction_count.map(|count| count > threshold);
        }
        if with_efficiency {
            record.efficiency_category = record
                .hourly_interaction_rate
                .and_then(EfficiencyCategory::from_rate);
        }
    }

    if with_tier {
        layout.push(SemanticSlot::Named(SemanticColumn::PerformanceTier));
    }
    if with_volume {
        layout.push(SemanticSlot::Named(SemanticColumn::HighVolumeDay));
    }
    if with_efficiency {
        layout.push(SemanticSlot::Named(SemanticColumn::EfficiencyCategory));
    }
    layout.push(SemanticSlot::Named(SemanticColumn::ProcessedTimestamp));
    log.steps.push("Business logic columns added".to_string());

    for column in RATIO_COLUMNS {
        if !layout.contains(&SemanticSlot::Named(column)) {
            continue;
        }
        rescale_ratio_column(&mut records, column);
    }
    log.steps.push("Data types standardized".to_string());

    let mut dataset = SemanticDataset {
        layout,
        extra_labels: cleaned.extra_labels.clone(),
        records,
        log,
    };
    dataset.log.validation = validate(&dataset);

    info!(
        rows = dataset.records.len(),
        columns = dataset.layout.len(),
        renamed = dataset.log.mappings_applied.len(),
        "semantic transformation complete"
    );

    dataset
}

/// Values on a 0-100 scale are brought down to 0-1; a column already within 0-1 is left alone.
fn rescale_ratio_column(records: &mut [SemanticRecord], column: SemanticColumn) {
    let max = records
        .iter_mut()
        .filter_map(|record| record.ratio_mut(column).and_then(|value| *value))
        .fold(f64::NEG_INFINITY, f64::max);
    if max <= 1.0 {
        return;
    }
    for record in records.iter_mut() {
        if let Some(value) = record.ratio_mut(column) {
            *value = value.map(|ratio| ratio / 100.0);
        }
    }
}

fn validate(dataset: &SemanticDataset) -> ValidationSummary {
    let missing_critical_columns: Vec<String> = CRITICAL_COLUMNS
        .iter()
        .filter(|column| !dataset.has(**column))
        .map(|column| column.name().to_string())
        .collect();
    if missing_critical_columns.is_empty() {
        info!("all critical columns present");
    } else {
        warn!(missing = ?missing_critical_columns, "missing critical columns");
    }

    ValidationSummary {
        total_rows: dataset.records.len(),
        total_columns: dataset.layout.len(),
        date_sample: dataset
            .records
            .iter()
            .filter_map(|record| record.performance_date)
            .take(3)
            .collect(),
        missing_critical_columns,
    }
}

pub(crate) fn median<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let mut sorted: Vec<f64> = values.filter(|value| !value.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    })
}
