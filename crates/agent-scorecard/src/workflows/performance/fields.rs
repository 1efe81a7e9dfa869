use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Columns of the cleaned schema. Source fields are read from the export; derived
/// fields are computed by the normalizer or the metric calculator and never read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ManagerHierarchyManager,
    ManagerHierarchyLocation,
    ManagerHierarchySupervisor,
    ManagerHierarchyName,
    DateYear,
    DateMonth,
    DateDay,
    Talk,
    Hold,
    Acw,
    Aht,
    InteractionCount,
    OsatWithAgent,
    ResolutionRate,
    Conformance,
    TalkAvailablePct,
    OffPhonePct,
    PaperlessConversion,
    HomeserveTransfers,
    AllconnectTransfers,
    Date,
    Weekday,
    WeekNumber,
    IsWeekend,
    AgentLastName,
    AgentFirstName,
    AgentMiddleInitial,
    PerformanceScore,
    CallsPerHour,
    TalkTimeGoalMet,
    HoldTimeGoalMet,
    AcwGoalMet,
    AhtGoalMet,
    DailyGoalsMetRate,
    AllTimeGoalsMet,
}

impl Field {
    pub const SOURCE: [Field; 20] = [
        Field::ManagerHierarchyManager,
        Field::ManagerHierarchyLocation,
        Field::ManagerHierarchySupervisor,
        Field::ManagerHierarchyName,
        Field::DateYear,
        Field::DateMonth,
        Field::DateDay,
        Field::Talk,
        Field::Hold,
        Field::Acw,
        Field::Aht,
        Field::InteractionCount,
        Field::OsatWithAgent,
        Field::ResolutionRate,
        Field::Conformance,
        Field::TalkAvailablePct,
        Field::OffPhonePct,
        Field::PaperlessConversion,
        Field::HomeserveTransfers,
        Field::AllconnectTransfers,
    ];

    /// Derived columns in the order they are appended to the cleaned export.
    pub const DERIVED: [Field; 15] = [
        Field::Date,
        Field::Weekday,
        Field::WeekNumber,
        Field::IsWeekend,
        Field::AgentLastName,
        Field::AgentFirstName,
        Field::AgentMiddleInitial,
        Field::PerformanceScore,
        Field::CallsPerHour,
        Field::TalkTimeGoalMet,
        Field::HoldTimeGoalMet,
        Field::AcwGoalMet,
        Field::AhtGoalMet,
        Field::DailyGoalsMetRate,
        Field::AllTimeGoalsMet,
    ];

    pub const DURATIONS: [Field; 4] = [Field::Talk, Field::Hold, Field::Acw, Field::Aht];

    pub fn label(self) -> &'static str {
        match self {
            Field::ManagerHierarchyManager => "manager_hierarchy_manager",
            Field::ManagerHierarchyLocation => "manager_hierarchy_location",
            Field::ManagerHierarchySupervisor => "manager_hierarchy_supervisor",
            Field::ManagerHierarchyName => "manager_hierarchy_name",
            Field::DateYear => "date_year",
            Field::DateMonth => "date_month",
            Field::DateDay => "date_day",
            Field::Talk => "talk",
            Field::Hold => "hold",
            Field::Acw => "acw",
            Field::Aht => "aht",
            Field::InteractionCount => "interaction_count",
            Field::OsatWithAgent => "osat_with_agent",
            Field::ResolutionRate => "resolution_rate",
            Field::Conformance => "conformance",
            Field::TalkAvailablePct => "talk_available_%",
            Field::OffPhonePct => "off_phone_%",
            Field::PaperlessConversion => "paperless_conversion",
            Field::HomeserveTransfers => "homeserve_transfers",
            Field::AllconnectTransfers => "allconnect_xfer/match_combo",
            Field::Date => "date",
            Field::Weekday => "weekday",
            Field::WeekNumber => "week_number",
            Field::IsWeekend => "is_weekend",
            Field::AgentLastName => "agent_last_name",
            Field::AgentFirstName => "agent_first_name",
            Field::AgentMiddleInitial => "agent_middle_initial",
            Field::PerformanceScore => "performance_score",
            Field::CallsPerHour => "calls_per_hour",
            Field::TalkTimeGoalMet => "talk_time_goal_met",
            Field::HoldTimeGoalMet => "hold_time_goal_met",
            Field::AcwGoalMet => "acw_goal_met",
            Field::AhtGoalMet => "aht_goal_met",
            Field::DailyGoalsMetRate => "daily_goals_met_rate",
            Field::AllTimeGoalsMet => "all_time_goals_met",
        }
    }

    /// Free-text columns keep their raw strings even when a value carries a `%`.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            Field::ManagerHierarchyManager
                | Field::ManagerHierarchyLocation
                | Field::ManagerHierarchySupervisor
                | Field::ManagerHierarchyName
                | Field::DateYear
                | Field::DateMonth
                | Field::DateDay
        )
    }

    pub fn is_derived(self) -> bool {
        Field::DERIVED.contains(&self)
    }
}

/// The set of schema fields structurally present in a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    fields: BTreeSet<Field>,
}

impl ColumnSet {
    pub fn insert(&mut self, field: Field) {
        self.fields.insert(field);
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    pub fn contains_all(&self, fields: &[Field]) -> bool {
        fields.iter().all(|field| self.contains(*field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single rendered value, used wherever columns are handled generically
/// (CSV export, missing-value counts, type inference).
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Number(value) => value.is_nan(),
            _ => false,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Number(value) if value.is_nan() => String::new(),
            Cell::Number(value) => value.to_string(),
            Cell::Integer(value) => value.to_string(),
            Cell::Bool(value) => value.to_string(),
            Cell::Date(value) => value.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn kind(&self) -> Option<CellKind> {
        if self.is_null() {
            return None;
        }
        Some(match self {
            Cell::Text(_) => CellKind::Text,
            Cell::Number(_) => CellKind::Float,
            Cell::Integer(_) => CellKind::Integer,
            Cell::Bool(_) => CellKind::Boolean,
            Cell::Date(_) => CellKind::Date,
            Cell::Null => return None,
        })
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::Text).unwrap_or(Cell::Null)
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        value
            .map(|text| Cell::Text(text.to_string()))
            .unwrap_or(Cell::Null)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Null)
    }
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map(Cell::Integer).unwrap_or(Cell::Null)
    }
}

impl From<Option<bool>> for Cell {
    fn from(value: Option<bool>) -> Self {
        value.map(Cell::Bool).unwrap_or(Cell::Null)
    }
}

impl From<Option<NaiveDate>> for Cell {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map(Cell::Date).unwrap_or(Cell::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Integer,
    Float,
    Boolean,
    Date,
    Text,
}

impl CellKind {
    pub fn label(self) -> &'static str {
        match self {
            CellKind::Empty => "empty",
            CellKind::Integer => "integer",
            CellKind::Float => "float",
            CellKind::Boolean => "boolean",
            CellKind::Date => "date",
            CellKind::Text => "text",
        }
    }

    /// Infers a column type from its values; mixed columns fall back to text.
    pub fn infer<'a, I>(cells: I) -> CellKind
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut inferred: Option<CellKind> = None;
        for kind in cells.into_iter().filter_map(Cell::kind) {
            inferred = match inferred {
                None => Some(kind),
                Some(current) if current == kind => Some(current),
                Some(CellKind::Integer) if kind == CellKind::Float => Some(CellKind::Float),
                Some(CellKind::Float) if kind == CellKind::Integer => Some(CellKind::Float),
                Some(_) => return CellKind::Text,
            };
        }
        inferred.unwrap_or(CellKind::Empty)
    }
}
