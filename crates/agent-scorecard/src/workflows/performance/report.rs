use super::aggregate::AgentPerformanceSummary;
use super::metrics::GoalTargets;
use super::quality::DataQualityReport;
use super::ranking::{Ranking, MIN_DAYS_WORKED};
use super::semantic::TransformationLog;
use chrono::NaiveDateTime;

const RULE: &str = "==================================================";

fn percent(value: Option<f64>) -> String {
    value
        .map(|value| format!("{:.1}%", value * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn decimal(value: Option<f64>, places: usize) -> String {
    value
        .map(|value| format!("{value:.places$}"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn mean_of<'a, I>(summaries: I, pick: fn(&AgentPerformanceSummary) -> Option<f64>) -> Option<f64>
where
    I: IntoIterator<Item = &'a AgentPerformanceSummary>,
{
    let (sum, count) = summaries
        .into_iter()
        .filter_map(pick)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Plain-text data-quality report written next to the cleaned export.
pub fn render_quality_report(report: &DataQualityReport) -> String {
    let mut lines = vec!["Data Quality Report".to_string(), RULE.to_string(), String::new()];

    lines.push(format!("rows_in: {}", report.rows_in));
    lines.push(format!("rows_out: {}", report.rows_out));
    lines.push(format!("duplicate_rows: {}", report.duplicate_rows));
    lines.push(format!("invalid_dates: {}", report.invalid_dates));
    lines.push(format!("unparsed_names: {}", report.unparsed_names));
    lines.push(String::new());

    for (title, counts) in [
        ("missing_values_before", &report.missing_values_before),
        ("missing_values_after", &report.missing_values_after),
    ] {
        lines.push(format!("{title}:"));
        if counts.is_empty() {
            lines.push("  none".to_string());
        }
        lines.extend(
            counts
                .iter()
                .map(|entry| format!("  {}: {}", entry.column, entry.count)),
        );
        lines.push(String::new());
    }

    lines.push(format!(
        "percentage_columns: {}",
        report.percentage_columns.join(", ")
    ));
    lines.push(format!(
        "zero_filled_columns: {}",
        report.zero_filled_columns.join(", ")
    ));
    lines.push(String::new());

    lines.push("column_types:".to_string());
    lines.extend(
        report
            .column_types
            .iter()
            .map(|entry| format!("  {}: {}", entry.column, entry.kind.label())),
    );
    lines.push(String::new());

    if let Some(range) = report.aht_range {
        lines.push("aht_range:".to_string());
        lines.push(format!("  min: {:.1}", range.min));
        lines.push(format!("  max: {:.1}", range.max));
        lines.push(format!("  mean: {:.1}", range.mean));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Plain-text log of the semantic transformation.
pub fn render_transformation_log(
    log: &TransformationLog,
    input: &str,
    output: &str,
    processed_at: NaiveDateTime,
) -> String {
    let mut lines = vec![
        "Semantic Transformation Log".to_string(),
        RULE.to_string(),
        String::new(),
        format!("Input file: {input}"),
        format!("Output file: {output}"),
        format!("Transformation date: {}", processed_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
        "Column Mapping Applied:".to_string(),
    ];
    lines.extend(
        log.mappings_applied
            .iter()
            .map(|(from, to)| format!("  {from} -> {to}")),
    );
    lines.push(String::new());

    lines.push("Transformation Steps:".to_string());
    lines.extend(log.steps.iter().map(|step| format!("  - {step}")));
    lines.push(String::new());

    let validation = &log.validation;
    let dates: Vec<String> = validation
        .date_sample
        .iter()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect();
    lines.push("Validation Results:".to_string());
    lines.push(format!("  total_rows: {}", validation.total_rows));
    lines.push(format!("  total_columns: {}", validation.total_columns));
    lines.push(format!("  date_format_sample: [{}]", dates.join(", ")));
    lines.push(format!(
        "  missing_critical_columns: [{}]",
        validation.missing_critical_columns.join(", ")
    ));

    lines.join("\n")
}

/// Inputs for the markdown top-performer report.
#[derive(Debug, Clone, Copy)]
pub struct PerformerReportContext<'a> {
    pub generated_at: NaiveDateTime,
    pub dataset: &'a str,
    pub summaries: &'a [AgentPerformanceSummary],
    pub ranking: &'a Ranking,
    pub goals: &'a GoalTargets,
}

pub fn render_top_performer_report(context: &PerformerReportContext<'_>) -> String {
    let PerformerReportContext {
        generated_at,
        dataset,
        summaries,
        ranking,
        goals,
    } = *context;
    let top = &ranking.top;

    let mut lines = vec![
        "# Top Performer Analysis Report".to_string(),
        String::new(),
        format!("> Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("> Dataset: {dataset}"),
        format!("> Total agents analyzed: {}", summaries.len()),
        format!(
            "> Qualified agents (≥{MIN_DAYS_WORKED} days): {}",
            ranking.qualified
        ),
        String::new(),
        format!("## Top {} Performers", top.len()),
        String::new(),
    ];

    for performer in top {
        let period = match (performer.first_performance_date, performer.last_performance_date) {
            (Some(first), Some(last)) => format!("{first} to {last}"),
            _ => "n/a".to_string(),
        };
        lines.extend([
            format!(
                "### #{}. {} {}",
                performer.rank.unwrap_or_default(),
                performer.agent_first_name,
                performer.agent_last_name
            ),
            String::new(),
            format!("**Full Name:** {}", performer.agent_name),
            format!(
                "**Composite Score:** {}",
                decimal(performer.composite_performance_score, 4)
            ),
            format!("**Days Worked:** {}", performer.days_worked),
            format!("**Period:** {period}"),
            String::new(),
            "**Goal Achievement:**".to_string(),
            format!(
                "- Overall Goal Rate: {}",
                percent(performer.overall_goal_achievement_rate)
            ),
            format!("- Perfect Days Rate: {}", percent(performer.perfect_days_rate)),
            format!("- Talk Time Goals: {}", percent(performer.talk_time_goal_met_mean)),
            format!("- Hold Time Goals: {}", percent(performer.hold_time_goal_met_mean)),
            format!("- ACW Goals: {}", percent(performer.acw_goal_met_mean)),
            format!("- AHT Goals: {}", percent(performer.aht_goal_met_mean)),
            String::new(),
            "**Performance Metrics:**".to_string(),
            format!(
                "- Avg Performance Score: {}",
                decimal(performer.avg_performance_score, 1)
            ),
            format!(
                "- Avg Daily Interactions: {}",
                decimal(performer.avg_daily_interactions, 1)
            ),
            format!("- Avg Hourly Rate: {}", decimal(performer.avg_hourly_rate, 1)),
            String::new(),
            "**Time Efficiency:**".to_string(),
            format!(
                "- Avg Talk Time: {}s (Goal: ≤{}s)",
                decimal(performer.talk_time_seconds_mean, 0),
                goals.talk_secs
            ),
            format!(
                "- Avg Hold Time: {}s (Goal: ≤{}s)",
                decimal(performer.hold_time_seconds_mean, 1),
                goals.hold_secs
            ),
            format!(
                "- Avg ACW Time: {}s (Goal: ≤{}s)",
                decimal(performer.after_call_work_seconds_mean, 1),
                goals.acw_secs
            ),
            format!(
                "- Avg AHT: {}s (Goal: ≤{}s)",
                decimal(performer.average_handle_time_seconds_mean, 0),
                goals.aht_secs
            ),
            String::new(),
            "**Quality Metrics:**".to_string(),
            format!(
                "- Customer Satisfaction: {}",
                decimal(performer.customer_satisfaction_score_mean, 1)
            ),
            format!(
                "- Resolution Rate: {}",
                decimal(performer.first_call_resolution_rate_mean, 1)
            ),
            format!(
                "- Schedule Adherence: {}",
                decimal(performer.schedule_adherence_rate_mean, 1)
            ),
            String::new(),
            "---".to_string(),
            String::new(),
        ]);
    }

    let goal_rate = |summary: &AgentPerformanceSummary| summary.overall_goal_achievement_rate;
    let score = |summary: &AgentPerformanceSummary| summary.avg_performance_score;
    let hourly = |summary: &AgentPerformanceSummary| summary.avg_hourly_rate;

    lines.extend([
        "## Summary Statistics".to_string(),
        String::new(),
        format!("| Metric | Top {} Average | All Agents Average |", top.len()),
        "|--------|---------------|-------------------|".to_string(),
        format!(
            "| Goal Achievement Rate | {} | {} |",
            percent(mean_of(top, goal_rate)),
            percent(mean_of(summaries, goal_rate))
        ),
        format!(
            "| Performance Score | {} | {} |",
            decimal(mean_of(top, score), 1),
            decimal(mean_of(summaries, score), 1)
        ),
        format!(
            "| Hourly Interaction Rate | {} | {} |",
            decimal(mean_of(top, hourly), 1),
            decimal(mean_of(summaries, hourly), 1)
        ),
    ]);

    lines.join("\n")
}
