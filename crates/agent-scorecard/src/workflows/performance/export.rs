use super::aggregate::AgentPerformanceSummary;
use super::domain::CleanedDataset;
use super::semantic::SemanticDataset;
use std::io::Write;

/// Cleaned export: source columns in input order followed by derived columns.
pub fn write_cleaned<W: Write>(dataset: &CleanedDataset, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    let layout = dataset.layout();
    out.write_record(layout.iter().map(|column| dataset.label(*column)))?;
    for event in &dataset.events {
        out.write_record(
            layout
                .iter()
                .map(|column| dataset.cell(event, *column).render()),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Semantic export in public column order.
pub fn write_semantic<W: Write>(dataset: &SemanticDataset, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(dataset.header())?;
    for record in &dataset.records {
        out.write_record(
            dataset
                .layout
                .iter()
                .map(|slot| dataset.cell(record, *slot).render()),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Agent summaries, or ranked top performers; both share the summary columns.
pub fn write_summaries<W: Write>(
    summaries: &[AgentPerformanceSummary],
    writer: W,
) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for summary in summaries {
        out.serialize(summary)?;
    }
    out.flush()?;
    Ok(())
}

/// Names of the ranked agents, the input to applicant matching.
pub fn write_performer_names<W: Write>(
    top: &[AgentPerformanceSummary],
    writer: W,
) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record([
        "rank",
        "agent_first_name",
        "agent_last_name",
        "agent_name",
        "composite_performance_score",
    ])?;
    for summary in top {
        out.write_record([
            summary.rank.map(|rank| rank.to_string()).unwrap_or_default(),
            summary.agent_first_name.clone(),
            summary.agent_last_name.clone(),
            summary.agent_name.clone(),
            summary
                .composite_performance_score
                .map(|score| format!("{score:.4}"))
                .unwrap_or_default(),
        ])?;
    }
    out.flush()?;
    Ok(())
}
