use super::aggregate::AgentPerformanceSummary;
use std::cmp::Ordering;
use tracing::info;

/// Agents with fewer dated days than this are never ranked.
pub const MIN_DAYS_WORKED: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct Ranking {
    /// Agents meeting the activity floor.
    pub qualified: usize,
    /// Ranked agents, best first, `rank` set from 1.
    pub top: Vec<AgentPerformanceSummary>,
}

/// Ranker: activity floor then top-`top_n` by composite score, descending. Ties keep
/// aggregation order. Agents without a composite score cannot be ranked.
pub fn top_performers(summaries: &[AgentPerformanceSummary], top_n: usize) -> Ranking {
    let qualified: Vec<&AgentPerformanceSummary> = summaries
        .iter()
        .filter(|summary| summary.days_worked >= MIN_DAYS_WORKED)
        .collect();

    let mut scored: Vec<(f64, &AgentPerformanceSummary)> = qualified
        .iter()
        .filter_map(|summary| {
            summary
                .composite_performance_score
                .filter(|score| !score.is_nan())
                .map(|score| (score, *summary))
        })
        .collect();
    scored.sort_by(|(left, _), (right, _)| right.partial_cmp(left).unwrap_or(Ordering::Equal));

    let top: Vec<AgentPerformanceSummary> = scored
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(index, (_, summary))| AgentPerformanceSummary {
            rank: Some(index + 1),
            ..summary.clone()
        })
        .collect();

    info!(
        qualified = qualified.len(),
        ranked = top.len(),
        "identified top performers"
    );

    Ranking {
        qualified: qualified.len(),
        top,
    }
}
