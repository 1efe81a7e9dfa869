use super::domain::{CleanedDataset, Column, PerformanceEvent};
use super::fields::{Cell, ColumnSet, Field};
use super::mapping::field_for_label;
use super::names::parse_agent_name;
use super::parser::{empty_as_none, parse_number, parse_whole, RawTable};
use super::quality::{missing_counts, DataQualityReport};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const DATE_PARTS: [Field; 3] = [Field::DateYear, Field::DateMonth, Field::DateDay];

/// Standardizes a raw column label: trimmed, `" - "` and spaces become underscores,
/// lowercased. Already-clean labels pass through unchanged.
pub fn clean_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .trim()
        .replace(" - ", "_")
        .replace(' ', "_")
        .to_lowercase()
}

/// Combines separate year/month/day cells into a calendar date. The month may be a
/// number or an English month name; any invalid combination yields `None`.
pub fn combine_date(year: Option<&str>, month: Option<&str>, day: Option<&str>) -> Option<NaiveDate> {
    let year = i32::try_from(parse_whole(year?)?).ok()?;
    let month = parse_month(month?)?;
    let day = u32::try_from(parse_whole(day?)?).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_month(value: &str) -> Option<u32> {
    if let Some(number) = parse_whole(value) {
        return u32::try_from(number)
            .ok()
            .filter(|month| (1..=12).contains(month));
    }

    let lowered = value.trim().to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| *name == lowered || (lowered.len() == 3 && name.starts_with(&lowered)))
        .map(|index| index as u32 + 1)
}

/// Field Normalizer: labels, canonical dates, percentage columns, parsed agent names and
/// zero-filled durations. Rows are never dropped; bad cells degrade to `None`.
pub fn normalize(raw: RawTable, report: &mut DataQualityReport) -> CleanedDataset {
    let labels: Vec<String> = raw.headers.iter().map(|header| clean_label(header)).collect();

    let mut columns = ColumnSet::default();
    let mut extra_labels = Vec::new();
    let mut source_layout = Vec::new();
    let mut slots: Vec<Option<Column>> = Vec::with_capacity(labels.len());

    for label in &labels {
        let slot = match field_for_label(label) {
            Some(field) if field.is_derived() => {
                debug!(column = %label, "derived column in input will be recomputed");
                None
            }
            Some(field) if columns.contains(field) => {
                warn!(column = %label, "duplicate column label ignored");
                None
            }
            Some(field) => {
                columns.insert(field);
                Some(Column::Known(field))
            }
            None => {
                extra_labels.push(label.clone());
                Some(Column::Extra(extra_labels.len() - 1))
            }
        };
        if let Some(column) = slot {
            source_layout.push(column);
        }
        slots.push(slot);
    }

    let percentage: Vec<bool> = slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let numeric = !matches!(slot, Some(Column::Known(field)) if field.is_text());
            numeric && slot.is_some() && raw.column(index).any(|value| value.contains('%'))
        })
        .collect();
    report.percentage_columns = labels
        .iter()
        .zip(&percentage)
        .filter(|(_, flagged)| **flagged)
        .map(|(label, _)| label.clone())
        .collect();

    let has_dates = columns.contains_all(&DATE_PARTS);
    if has_dates {
        for field in [Field::Date, Field::Weekday, Field::WeekNumber, Field::IsWeekend] {
            columns.insert(field);
        }
    } else {
        warn!("date_year/date_month/date_day not all present; no canonical date column");
    }

    let has_names = columns.contains(Field::ManagerHierarchyName);
    if has_names {
        for field in [
            Field::AgentLastName,
            Field::AgentFirstName,
            Field::AgentMiddleInitial,
        ] {
            columns.insert(field);
        }
    }

    let events: Vec<PerformanceEvent> = raw
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut event = build_event(index + 1, row, &slots, &percentage, extra_labels.len());
            if has_dates {
                event.date = combine_date(
                    event.date_year.as_deref(),
                    event.date_month.as_deref(),
                    event.date_day.as_deref(),
                );
            }
            if has_names {
                event.name = parse_agent_name(event.agent_name.as_deref());
            }
            event
        })
        .collect();

    report.rows_in = raw.rows.len();
    if has_dates {
        report.invalid_dates = events.iter().filter(|event| event.date.is_none()).count();
    }
    if has_names {
        report.unparsed_names = events.iter().filter(|event| event.name.is_empty()).count();
    }

    let mut dataset = CleanedDataset {
        source_layout,
        extra_labels,
        columns,
        events,
    };

    report.missing_values_before = missing_counts(&dataset);
    fill_missing_durations(&mut dataset, report);
    report.missing_values_after = missing_counts(&dataset);
    report.rows_out = dataset.events.len();

    info!(
        rows = dataset.events.len(),
        columns = dataset.layout().len(),
        invalid_dates = report.invalid_dates,
        "normalized performance export"
    );

    dataset
}

fn build_event(
    row_number: usize,
    row: &[String],
    slots: &[Option<Column>],
    percentage: &[bool],
    extra_count: usize,
) -> PerformanceEvent {
    let mut event = PerformanceEvent {
        row_number,
        extras: vec![Cell::Null; extra_count],
        ..PerformanceEvent::default()
    };

    for (index, slot) in slots.iter().enumerate() {
        let value = row.get(index).map(String::as_str).unwrap_or("");
        match slot {
            Some(Column::Known(field)) if field.is_text() => {
                if let Some(target) = event.text_mut(*field) {
                    *target = empty_as_none(value).map(str::to_string);
                }
            }
            Some(Column::Known(field)) => {
                if let Some(target) = event.value_mut(*field) {
                    *target = parse_number(value, percentage[index]);
                }
            }
            Some(Column::Extra(extra)) => {
                event.extras[*extra] = extra_cell(value, percentage[index]);
            }
            None => {}
        }
    }

    event
}

fn extra_cell(value: &str, percentage: bool) -> Cell {
    if percentage {
        return parse_number(value, true).into();
    }
    match empty_as_none(value) {
        None => Cell::Null,
        Some(text) => parse_number(text, false)
            .map(Cell::Number)
            .unwrap_or_else(|| Cell::Text(text.to_string())),
    }
}

/// A missing duration means no calls that day, so it becomes zero. Every other column
/// keeps its nulls.
fn fill_missing_durations(dataset: &mut CleanedDataset, report: &mut DataQualityReport) {
    for field in Field::DURATIONS {
        if !dataset.columns.contains(field) {
            continue;
        }
        let mut filled = 0usize;
        for event in &mut dataset.events {
            if let Some(slot) = event.value_mut(field) {
                if slot.is_none() {
                    *slot = Some(0.0);
                    filled += 1;
                }
            }
        }
        debug!(column = field.label(), filled, "zero-filled missing durations");
        report.zero_filled_columns.push(field.label().to_string());
    }
}
