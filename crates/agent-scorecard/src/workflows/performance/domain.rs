use super::fields::{Cell, ColumnSet, Field};
use super::names::ParsedName;
use chrono::{Datelike, NaiveDate, Weekday};

/// One agent's metrics for one calendar day, as produced by the normalizer and
/// enriched by the metric calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceEvent {
    /// 1-based data row in the source export.
    pub row_number: usize,
    pub manager: Option<String>,
    pub location: Option<String>,
    pub supervisor: Option<String>,
    pub agent_name: Option<String>,
    pub name: ParsedName,
    pub date_year: Option<String>,
    pub date_month: Option<String>,
    pub date_day: Option<String>,
    pub date: Option<NaiveDate>,
    pub talk: Option<f64>,
    pub hold: Option<f64>,
    pub acw: Option<f64>,
    pub aht: Option<f64>,
    pub interaction_count: Option<f64>,
    pub osat_with_agent: Option<f64>,
    pub resolution_rate: Option<f64>,
    pub conformance: Option<f64>,
    pub talk_available: Option<f64>,
    pub off_phone: Option<f64>,
    pub paperless_conversion: Option<f64>,
    pub homeserve_transfers: Option<f64>,
    pub allconnect_transfers: Option<f64>,
    pub performance_score: Option<f64>,
    pub calls_per_hour: Option<f64>,
    pub goals: GoalFlags,
    /// Cells for columns outside the schema, aligned with `CleanedDataset::extra_labels`.
    pub extras: Vec<Cell>,
}

/// Per-metric goal attainment for one day. `None` when the metric column is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalFlags {
    pub talk: Option<bool>,
    pub hold: Option<bool>,
    pub acw: Option<bool>,
    pub aht: Option<bool>,
}

impl GoalFlags {
    fn available(&self) -> impl Iterator<Item = bool> {
        [self.talk, self.hold, self.acw, self.aht].into_iter().flatten()
    }

    /// Share of the available goals met on this day.
    pub fn daily_rate(&self) -> Option<f64> {
        let (met, total) = self
            .available()
            .fold((0usize, 0usize), |(met, total), flag| {
                (met + usize::from(flag), total + 1)
            });
        (total > 0).then(|| met as f64 / total as f64)
    }

    /// True when every available goal was met.
    pub fn all_met(&self) -> Option<bool> {
        let mut flags = self.available().peekable();
        flags.peek()?;
        Some(flags.all(|flag| flag))
    }
}

impl PerformanceEvent {
    pub fn weekday(&self) -> Option<&'static str> {
        self.date.map(|date| weekday_name(date.weekday()))
    }

    pub fn week_number(&self) -> Option<i64> {
        self.date.map(|date| i64::from(date.iso_week().week()))
    }

    pub fn is_weekend(&self) -> Option<bool> {
        self.date
            .map(|date| matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
    }

    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Talk => self.talk,
            Field::Hold => self.hold,
            Field::Acw => self.acw,
            Field::Aht => self.aht,
            Field::InteractionCount => self.interaction_count,
            Field::OsatWithAgent => self.osat_with_agent,
            Field::ResolutionRate => self.resolution_rate,
            Field::Conformance => self.conformance,
            Field::TalkAvailablePct => self.talk_available,
            Field::OffPhonePct => self.off_phone,
            Field::PaperlessConversion => self.paperless_conversion,
            Field::HomeserveTransfers => self.homeserve_transfers,
            Field::AllconnectTransfers => self.allconnect_transfers,
            Field::PerformanceScore => self.performance_score,
            Field::CallsPerHour => self.calls_per_hour,
            Field::DailyGoalsMetRate => self.goals.daily_rate(),
            _ => None,
        }
    }

    pub(crate) fn value_mut(&mut self, field: Field) -> Option<&mut Option<f64>> {
        Some(match field {
            Field::Talk => &mut self.talk,
            Field::Hold => &mut self.hold,
            Field::Acw => &mut self.acw,
            Field::Aht => &mut self.aht,
            Field::InteractionCount => &mut self.interaction_count,
            Field::OsatWithAgent => &mut self.osat_with_agent,
            Field::ResolutionRate => &mut self.resolution_rate,
            Field::Conformance => &mut self.conformance,
            Field::TalkAvailablePct => &mut self.talk_available,
            Field::OffPhonePct => &mut self.off_phone,
            Field::PaperlessConversion => &mut self.paperless_conversion,
            Field::HomeserveTransfers => &mut self.homeserve_transfers,
            Field::AllconnectTransfers => &mut self.allconnect_transfers,
            _ => return None,
        })
    }

    pub(crate) fn text_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        Some(match field {
            Field::ManagerHierarchyManager => &mut self.manager,
            Field::ManagerHierarchyLocation => &mut self.location,
            Field::ManagerHierarchySupervisor => &mut self.supervisor,
            Field::ManagerHierarchyName => &mut self.agent_name,
            Field::DateYear => &mut self.date_year,
            Field::DateMonth => &mut self.date_month,
            Field::DateDay => &mut self.date_day,
            _ => return None,
        })
    }

    pub fn cell(&self, field: Field) -> Cell {
        match field {
            Field::ManagerHierarchyManager => self.manager.clone().into(),
            Field::ManagerHierarchyLocation => self.location.clone().into(),
            Field::ManagerHierarchySupervisor => self.supervisor.clone().into(),
            Field::ManagerHierarchyName => self.agent_name.clone().into(),
            Field::DateYear => self.date_year.clone().into(),
            Field::DateMonth => self.date_month.clone().into(),
            Field::DateDay => self.date_day.clone().into(),
            Field::Date => self.date.into(),
            Field::Weekday => self.weekday().into(),
            Field::WeekNumber => self.week_number().into(),
            Field::IsWeekend => self.is_weekend().into(),
            Field::AgentLastName => self.name.last.clone().into(),
            Field::AgentFirstName => self.name.first.clone().into(),
            Field::AgentMiddleInitial => self.name.middle_initial.clone().into(),
            Field::TalkTimeGoalMet => self.goals.talk.into(),
            Field::HoldTimeGoalMet => self.goals.hold.into(),
            Field::AcwGoalMet => self.goals.acw.into(),
            Field::AhtGoalMet => self.goals.aht.into(),
            Field::AllTimeGoalsMet => self.goals.all_met().into(),
            numeric => self.value(numeric).into(),
        }
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Position of a source column in the cleaned export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Known(Field),
    Extra(usize),
}

/// Output of the normalizer (and, after enrichment, of the metric calculator).
#[derive(Debug, Clone, Default)]
pub struct CleanedDataset {
    /// Source columns in export order.
    pub source_layout: Vec<Column>,
    pub extra_labels: Vec<String>,
    pub columns: ColumnSet,
    pub events: Vec<PerformanceEvent>,
}

impl CleanedDataset {
    /// Source columns followed by every derived column present.
    pub fn layout(&self) -> Vec<Column> {
        let mut layout = self.source_layout.clone();
        layout.extend(
            Field::DERIVED
                .iter()
                .filter(|field| self.columns.contains(**field))
                .map(|field| Column::Known(*field)),
        );
        layout
    }

    pub fn label(&self, column: Column) -> &str {
        match column {
            Column::Known(field) => field.label(),
            Column::Extra(index) => self.extra_labels[index].as_str(),
        }
    }

    pub fn cell(&self, event: &PerformanceEvent, column: Column) -> Cell {
        match column {
            Column::Known(field) => event.cell(field),
            Column::Extra(index) => event.extras.get(index).cloned().unwrap_or(Cell::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_flags_summarize_available_metrics() {
        let flags = GoalFlags {
            talk: Some(true),
            hold: Some(false),
            acw: None,
            aht: Some(true),
        };
        let rate = flags.daily_rate().expect("rate");
        assert!((rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(flags.all_met(), Some(false));

        let none = GoalFlags::default();
        assert_eq!(none.daily_rate(), None);
        assert_eq!(none.all_met(), None);
    }

    #[test]
    fn derived_date_fields_follow_the_calendar() {
        let event = PerformanceEvent {
            date: NaiveDate::from_ymd_opt(2025, 3, 8),
            ..PerformanceEvent::default()
        };
        assert_eq!(event.weekday(), Some("Saturday"));
        assert_eq!(event.week_number(), Some(10));
        assert_eq!(event.is_weekend(), Some(true));

        let undated = PerformanceEvent::default();
        assert_eq!(undated.cell(Field::IsWeekend), Cell::Null);
    }
}
