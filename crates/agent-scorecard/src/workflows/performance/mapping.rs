use super::fields::Field;
use std::collections::HashMap;
use std::sync::OnceLock;

static FIELD_LABELS: OnceLock<HashMap<&'static str, Field>> = OnceLock::new();

/// Resolves a cleaned column label to a schema field.
pub(crate) fn field_for_label(label: &str) -> Option<Field> {
    field_labels().get(label).copied()
}

fn field_labels() -> &'static HashMap<&'static str, Field> {
    FIELD_LABELS.get_or_init(|| {
        Field::SOURCE
            .iter()
            .chain(Field::DERIVED.iter())
            .map(|field| (field.label(), *field))
            .collect()
    })
}

/// Columns of the public (semantic) schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticColumn {
    ManagerName,
    Location,
    SupervisorName,
    AgentName,
    PerformanceYear,
    PerformanceMonth,
    PerformanceDay,
    PerformanceDate,
    DayOfWeek,
    WeekOfYear,
    IsWeekendDay,
    TalkTimeSeconds,
    HoldTimeSeconds,
    AfterCallWorkSeconds,
    AverageHandleTimeSeconds,
    TotalInteractions,
    CustomerSatisfactionScore,
    FirstCallResolutionRate,
    ScheduleAdherenceRate,
    TalkTimeAvailabilityPct,
    OffPhoneTimePct,
    PaperlessConversionRate,
    HomeserveTransferCount,
    AllconnectTransferCount,
    OverallPerformanceScore,
    HourlyInteractionRate,
    AgentLastName,
    AgentFirstName,
    AgentMiddleInitial,
    TalkTimeGoalMet,
    HoldTimeGoalMet,
    AcwGoalMet,
    AhtGoalMet,
    DailyGoalsMetRate,
    AllTimeGoalsMet,
    PerformanceTier,
    HighVolumeDay,
    EfficiencyCategory,
    ProcessedTimestamp,
}

impl SemanticColumn {
    pub fn name(self) -> &'static str {
        match self {
            SemanticColumn::ManagerName => "manager_name",
            SemanticColumn::Location => "location",
            SemanticColumn::SupervisorName => "supervisor_name",
            SemanticColumn::AgentName => "agent_name",
            SemanticColumn::PerformanceYear => "performance_year",
            SemanticColumn::PerformanceMonth => "performance_month",
            SemanticColumn::PerformanceDay => "performance_day",
            SemanticColumn::PerformanceDate => "performance_date",
            SemanticColumn::DayOfWeek => "day_of_week",
            SemanticColumn::WeekOfYear => "week_of_year",
            SemanticColumn::IsWeekendDay => "is_weekend_day",
            SemanticColumn::TalkTimeSeconds => "talk_time_seconds",
            SemanticColumn::HoldTimeSeconds => "hold_time_seconds",
            SemanticColumn::AfterCallWorkSeconds => "after_call_work_seconds",
            SemanticColumn::AverageHandleTimeSeconds => "average_handle_time_seconds",
            SemanticColumn::TotalInteractions => "total_interactions",
            SemanticColumn::CustomerSatisfactionScore => "customer_satisfaction_score",
            SemanticColumn::FirstCallResolutionRate => "first_call_resolution_rate",
            SemanticColumn::ScheduleAdherenceRate => "schedule_adherence_rate",
            SemanticColumn::TalkTimeAvailabilityPct => "talk_time_availability_pct",
            SemanticColumn::OffPhoneTimePct => "off_phone_time_pct",
            SemanticColumn::PaperlessConversionRate => "paperless_conversion_rate",
            SemanticColumn::HomeserveTransferCount => "homeserve_transfer_count",
            SemanticColumn::AllconnectTransferCount => "allconnect_transfer_count",
            SemanticColumn::OverallPerformanceScore => "overall_performance_score",
            SemanticColumn::HourlyInteractionRate => "hourly_interaction_rate",
            SemanticColumn::AgentLastName => "agent_last_name",
            SemanticColumn::AgentFirstName => "agent_first_name",
            SemanticColumn::AgentMiddleInitial => "agent_middle_initial",
            SemanticColumn::TalkTimeGoalMet => "talk_time_goal_met",
            SemanticColumn::HoldTimeGoalMet => "hold_time_goal_met",
            SemanticColumn::AcwGoalMet => "acw_goal_met",
            SemanticColumn::AhtGoalMet => "aht_goal_met",
            SemanticColumn::DailyGoalsMetRate => "daily_goals_met_rate",
            SemanticColumn::AllTimeGoalsMet => "all_time_goals_met",
            SemanticColumn::PerformanceTier => "performance_tier",
            SemanticColumn::HighVolumeDay => "high_volume_day",
            SemanticColumn::EfficiencyCategory => "efficiency_category",
            SemanticColumn::ProcessedTimestamp => "processed_timestamp",
        }
    }
}

/// Cleaned name to public name. Table order is the semantic export's column order.
pub const SEMANTIC_MAPPING: &[(Field, SemanticColumn)] = &[
    // Identity / hierarchy
    (Field::ManagerHierarchyManager, SemanticColumn::ManagerName),
    (Field::ManagerHierarchyLocation, SemanticColumn::Location),
    (Field::ManagerHierarchySupervisor, SemanticColumn::SupervisorName),
    (Field::ManagerHierarchyName, SemanticColumn::AgentName),
    // Dates
    (Field::DateYear, SemanticColumn::PerformanceYear),
    (Field::DateMonth, SemanticColumn::PerformanceMonth),
    (Field::DateDay, SemanticColumn::PerformanceDay),
    (Field::Date, SemanticColumn::PerformanceDate),
    (Field::Weekday, SemanticColumn::DayOfWeek),
    (Field::WeekNumber, SemanticColumn::WeekOfYear),
    (Field::IsWeekend, SemanticColumn::IsWeekendDay),
    // Core performance
    (Field::Talk, SemanticColumn::TalkTimeSeconds),
    (Field::Hold, SemanticColumn::HoldTimeSeconds),
    (Field::Acw, SemanticColumn::AfterCallWorkSeconds),
    (Field::Aht, SemanticColumn::AverageHandleTimeSeconds),
    (Field::InteractionCount, SemanticColumn::TotalInteractions),
    // Quality
    (Field::OsatWithAgent, SemanticColumn::CustomerSatisfactionScore),
    (Field::ResolutionRate, SemanticColumn::FirstCallResolutionRate),
    (Field::Conformance, SemanticColumn::ScheduleAdherenceRate),
    // Availability
    (Field::TalkAvailablePct, SemanticColumn::TalkTimeAvailabilityPct),
    (Field::OffPhonePct, SemanticColumn::OffPhoneTimePct),
    // Sales / transfers
    (Field::PaperlessConversion, SemanticColumn::PaperlessConversionRate),
    (Field::HomeserveTransfers, SemanticColumn::HomeserveTransferCount),
    (Field::AllconnectTransfers, SemanticColumn::AllconnectTransferCount),
    // Calculated
    (Field::PerformanceScore, SemanticColumn::OverallPerformanceScore),
    (Field::CallsPerHour, SemanticColumn::HourlyInteractionRate),
];

/// Cleaned columns that keep their name in the public schema.
pub const PASSTHROUGH: &[(Field, SemanticColumn)] = &[
    (Field::AgentFirstName, SemanticColumn::AgentFirstName),
    (Field::AgentLastName, SemanticColumn::AgentLastName),
    (Field::AgentMiddleInitial, SemanticColumn::AgentMiddleInitial),
    (Field::TalkTimeGoalMet, SemanticColumn::TalkTimeGoalMet),
    (Field::HoldTimeGoalMet, SemanticColumn::HoldTimeGoalMet),
    (Field::AcwGoalMet, SemanticColumn::AcwGoalMet),
    (Field::AhtGoalMet, SemanticColumn::AhtGoalMet),
    (Field::DailyGoalsMetRate, SemanticColumn::DailyGoalsMetRate),
    (Field::AllTimeGoalsMet, SemanticColumn::AllTimeGoalsMet),
];

/// Ratio columns rescaled from 0-100 to 0-1 when their maximum exceeds 1.
pub const RATIO_COLUMNS: [SemanticColumn; 6] = [
    SemanticColumn::TalkTimeAvailabilityPct,
    SemanticColumn::OffPhoneTimePct,
    SemanticColumn::PaperlessConversionRate,
    SemanticColumn::FirstCallResolutionRate,
    SemanticColumn::ScheduleAdherenceRate,
    SemanticColumn::CustomerSatisfactionScore,
];

pub const CRITICAL_COLUMNS: [SemanticColumn; 3] = [
    SemanticColumn::AgentName,
    SemanticColumn::PerformanceDate,
    SemanticColumn::OverallPerformanceScore,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_label_resolves_to_its_field() {
        for field in Field::SOURCE.iter().chain(Field::DERIVED.iter()) {
            assert_eq!(field_for_label(field.label()), Some(*field));
        }
        assert_eq!(field_for_label("Talk"), None);
        assert_eq!(field_for_label("notes"), None);
    }

    #[test]
    fn mapping_targets_are_unique() {
        let names: HashSet<&str> = SEMANTIC_MAPPING
            .iter()
            .chain(PASSTHROUGH.iter())
            .map(|(_, column)| column.name())
            .collect();
        assert_eq!(names.len(), SEMANTIC_MAPPING.len() + PASSTHROUGH.len());
        assert_eq!(SEMANTIC_MAPPING.len(), 26);
    }

    #[test]
    fn mapping_matches_public_vocabulary() {
        let lookup: HashMap<&str, &str> = SEMANTIC_MAPPING
            .iter()
            .map(|(field, column)| (field.label(), column.name()))
            .collect();
        assert_eq!(lookup["manager_hierarchy_name"], "agent_name");
        assert_eq!(lookup["talk_available_%"], "talk_time_availability_pct");
        assert_eq!(lookup["allconnect_xfer/match_combo"], "allconnect_transfer_count");
        assert_eq!(lookup["calls_per_hour"], "hourly_interaction_rate");
    }
}
