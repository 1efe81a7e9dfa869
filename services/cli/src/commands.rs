use crate::infra::{artifact_stamp, now, SqliteApplicantSource, SqliteAssessmentSource};
use agent_scorecard::config::AppConfig;
use agent_scorecard::error::AppError;
use agent_scorecard::workflows::linkage::{
    attach_assessments, generate_insights, write_matches, ApplicantFilter, ApplicantSource,
    AssessmentSource, CsvApplicantSource, CsvAssessmentSource, LinkageInsights, PerformerProfile,
    RecordLinker, SourceError,
};
use agent_scorecard::workflows::performance::{
    render_quality_report, render_top_performer_report, render_transformation_log,
    write_cleaned, write_performer_names, write_semantic, write_summaries, DataQualityReport,
    PerformancePipeline, PerformerReportContext,
};
use chrono::NaiveDateTime;
use clap::Args;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Daily performance export (CSV)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the configured directory for processed datasets
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Override the configured directory for the markdown report
    #[arg(long)]
    pub(crate) reports_dir: Option<PathBuf>,
    /// Override the configured number of top performers (at least 1)
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub(crate) top_n: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct CleanArgs {
    /// Daily performance export (CSV)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the configured directory for processed datasets
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct LinkArgs {
    /// Daily performance export (CSV) the performer profiles are built from
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Applicant CSV export
    #[arg(long, conflicts_with = "applicants_db", required_unless_present = "applicants_db")]
    pub(crate) applicants_csv: Option<PathBuf>,
    /// SQLite database holding the applicant portal tables
    #[arg(long)]
    pub(crate) applicants_db: Option<PathBuf>,
    /// Restrict applicants to these client ids (repeatable); overrides SCORECARD_CLIENT_IDS
    #[arg(long = "client-id")]
    pub(crate) client_ids: Vec<i64>,
    /// Resume scores and AI assessments (CSV keyed by applicant_id) to attach to matches
    #[arg(long, conflicts_with = "assessments_db")]
    pub(crate) assessments_csv: Option<PathBuf>,
    /// SQLite database holding the resume score and AI assessment tables
    #[arg(long)]
    pub(crate) assessments_db: Option<PathBuf>,
    /// Link only the ranked top performers instead of every agent in the export
    #[arg(long)]
    pub(crate) top_only: bool,
    /// Override the configured directory for processed datasets
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
}

fn prepare_dir(override_dir: Option<PathBuf>, configured: &Path) -> Result<PathBuf, AppError> {
    let dir = override_dir.unwrap_or_else(|| configured.to_path_buf());
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_score(value: Option<f64>, precision: usize) -> String {
    value
        .map(|value| format!("{value:.precision$}"))
        .unwrap_or_else(|| "n/a".to_string())
}

pub(crate) fn run_pipeline(config: &AppConfig, args: RunArgs) -> Result<(), AppError> {
    let RunArgs {
        input,
        output_dir,
        reports_dir,
        top_n,
    } = args;

    let mut scoring = config.scoring.clone();
    if let Some(top_n) = top_n {
        scoring.top_n = top_n;
    }
    let processed_dir = prepare_dir(output_dir, &config.output.processed_dir)?;
    let reports_dir = prepare_dir(reports_dir, &config.output.reports_dir)?;

    let processed_at = now();
    let stamp = artifact_stamp(processed_at);
    let pipeline = PerformancePipeline::new(&scoring);
    let outcome = pipeline.run_path(&input, processed_at)?;

    let cleaned_path = processed_dir.join(format!("agent_cleaned_{stamp}.csv"));
    write_cleaned(&outcome.cleaned, File::create(&cleaned_path)?)?;
    write_quality_artifacts(&processed_dir, &stamp, &outcome.quality)?;

    let semantic_path = processed_dir.join(format!("agent_semantic_{stamp}.csv"));
    write_semantic(&outcome.semantic, File::create(&semantic_path)?)?;
    let log_text = render_transformation_log(
        &outcome.semantic.log,
        &display_name(&cleaned_path),
        &display_name(&semantic_path),
        processed_at,
    );
    fs::write(
        processed_dir.join(format!("semantic_transformation_log_{stamp}.txt")),
        log_text,
    )?;

    let summary_path = processed_dir.join(format!("agent_performance_summary_{stamp}.csv"));
    write_summaries(&outcome.summaries, File::create(&summary_path)?)?;
    let top_path = processed_dir.join(format!("top_performers_{stamp}.csv"));
    write_summaries(&outcome.ranking.top, File::create(&top_path)?)?;
    let names_path = processed_dir.join(format!("top_performer_names_{stamp}.csv"));
    write_performer_names(&outcome.ranking.top, File::create(&names_path)?)?;

    let dataset_name = display_name(&input);
    let report = render_top_performer_report(&PerformerReportContext {
        generated_at: processed_at,
        dataset: &dataset_name,
        summaries: &outcome.summaries,
        ranking: &outcome.ranking,
        goals: pipeline.goals(),
    });
    let report_path = reports_dir.join(format!("top_performers_report_{stamp}.md"));
    fs::write(&report_path, report)?;

    info!(
        agents = outcome.summaries.len(),
        qualified = outcome.ranking.qualified,
        report = %report_path.display(),
        "pipeline run complete"
    );

    println!("Agent performance pipeline");
    println!(
        "  Rows processed: {} in / {} out",
        outcome.quality.rows_in, outcome.quality.rows_out
    );
    println!(
        "  Agents summarized: {} ({} qualified for ranking)",
        outcome.summaries.len(),
        outcome.ranking.qualified
    );
    if outcome.ranking.top.is_empty() {
        println!("  No agents met the ranking threshold");
    } else {
        println!("  Top {} performers:", outcome.ranking.top.len());
        for summary in &outcome.ranking.top {
            println!(
                "    {}. {} (composite {}, {} days)",
                summary.rank.unwrap_or_default(),
                summary.full_name(),
                format_score(summary.composite_performance_score, 4),
                summary.days_worked
            );
        }
    }
    println!("  Processed data: {}", processed_dir.display());
    println!("  Report: {}", report_path.display());

    Ok(())
}

pub(crate) fn run_clean(config: &AppConfig, args: CleanArgs) -> Result<(), AppError> {
    let CleanArgs { input, output_dir } = args;
    let processed_dir = prepare_dir(output_dir, &config.output.processed_dir)?;
    let stamp = artifact_stamp(now());

    let outcome = PerformancePipeline::new(&config.scoring).clean_path(&input)?;
    let cleaned_path = processed_dir.join(format!("agent_cleaned_{stamp}.csv"));
    write_cleaned(&outcome.dataset, File::create(&cleaned_path)?)?;
    write_quality_artifacts(&processed_dir, &stamp, &outcome.quality)?;

    println!("Cleaned {}", display_name(&input));
    println!(
        "  Rows: {} in / {} out",
        outcome.quality.rows_in, outcome.quality.rows_out
    );
    println!("  Invalid dates: {}", outcome.quality.invalid_dates);
    println!("  Unparsed names: {}", outcome.quality.unparsed_names);
    println!("  Duplicate rows: {}", outcome.quality.duplicate_rows);
    println!("  Output: {}", cleaned_path.display());

    Ok(())
}

pub(crate) fn run_link(config: &AppConfig, args: LinkArgs) -> Result<(), AppError> {
    let LinkArgs {
        input,
        applicants_csv,
        applicants_db,
        client_ids,
        assessments_csv,
        assessments_db,
        top_only,
        output_dir,
    } = args;

    let processed_dir = prepare_dir(output_dir, &config.output.processed_dir)?;
    let processed_at = now();
    let stamp = artifact_stamp(processed_at);
    let pipeline = PerformancePipeline::new(&config.scoring);

    let performers = load_performers(&pipeline, &input, top_only, processed_at)?;
    let source: Box<dyn ApplicantSource> = match (applicants_csv, applicants_db) {
        (Some(path), _) => Box::new(CsvApplicantSource::new(path)),
        (None, Some(path)) => Box::new(SqliteApplicantSource::open(&path)?),
        (None, None) => {
            return Err(SourceError::Unavailable(
                "pass --applicants-csv or --applicants-db".to_string(),
            )
            .into())
        }
    };
    let filter = if client_ids.is_empty() {
        ApplicantFilter::for_clients(config.linkage.client_ids.clone())
    } else {
        ApplicantFilter::for_clients(client_ids)
    };

    let mut linker = RecordLinker::new();
    linker.load_performers(performers);
    linker.load_applicants_from(source.as_ref(), &filter)?;
    let mut matches = linker.link()?;

    let assessments: Option<Box<dyn AssessmentSource>> = match (assessments_csv, assessments_db) {
        (Some(path), _) => Some(Box::new(CsvAssessmentSource::new(path))),
        (None, Some(path)) => Some(Box::new(SqliteAssessmentSource::open(&path)?)),
        (None, None) => None,
    };
    if let Some(assessments) = assessments {
        attach_assessments(&mut matches, assessments.as_ref())?;
    }
    let insights = generate_insights(&matches);

    let matches_path = processed_dir.join(format!("matched_candidates_{stamp}.csv"));
    write_matches(&matches, File::create(&matches_path)?)?;
    let insights_path = processed_dir.join(format!("linkage_insights_{stamp}.json"));
    serde_json::to_writer_pretty(File::create(&insights_path)?, &insights)?;

    print_insights(&insights);
    println!("  Matches: {}", matches_path.display());
    Ok(())
}

fn load_performers(
    pipeline: &PerformancePipeline,
    input: &Path,
    top_only: bool,
    processed_at: NaiveDateTime,
) -> Result<Vec<PerformerProfile>, AppError> {
    if top_only {
        let outcome = pipeline.run_path(input, processed_at)?;
        return Ok(outcome
            .ranking
            .top
            .iter()
            .map(PerformerProfile::from_summary)
            .collect());
    }
    let outcome = pipeline.clean_path(input)?;
    Ok(PerformerProfile::from_events(&outcome.dataset.events))
}

fn print_insights(insights: &LinkageInsights) {
    println!("Applicant linkage");
    println!("  Matched candidates: {}", insights.total_matches);
    if insights.total_matches == 0 {
        println!("  No applications predate a performer's first recorded day");
        return;
    }
    println!("  Unique clients: {}", insights.unique_clients);
    if let (Some(earliest), Some(latest)) =
        (insights.earliest_application, insights.latest_application)
    {
        println!("  Application window: {earliest} to {latest}");
    }
    println!(
        "  Avg performance score: {} (80th percentile {})",
        format_score(insights.avg_performance_score, 2),
        format_score(insights.top_performer_threshold, 2)
    );
    println!(
        "  Avg calls per hour: {}",
        format_score(insights.avg_calls_per_hour, 2)
    );
    println!(
        "  Years from application to first day: avg {}, range {}-{}",
        format_score(insights.avg_years_to_first_performance, 2),
        insights
            .min_years_to_first_performance
            .map(|years| years.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
        insights
            .max_years_to_first_performance
            .map(|years| years.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!("  Client distribution:");
    for entry in &insights.client_distribution {
        println!("    {}: {}", entry.client, entry.matches);
    }

    if let Some(resume) = &insights.resume {
        println!("  Resume scores ({} matches):", resume.scored);
        println!("    Average: {}", format_score(resume.avg_score, 2));
        println!(
            "    Top-performer average: {}",
            format_score(resume.high_performers_avg_score, 2)
        );
        for entry in &resume.education_distribution {
            println!("    {}: {}", entry.label, entry.count);
        }
    }
    if let Some(assessment) = &insights.assessment {
        let accuracy = &assessment.prediction_accuracy;
        println!("  AI assessments ({} matches):", assessment.assessed);
        println!("    Average score: {}", format_score(assessment.avg_score, 2));
        for entry in &assessment.recommendation_distribution {
            println!("    {}: {}", entry.label, entry.count);
        }
        println!(
            "    Prediction accuracy: {:.1}% ({} of {} against median score {})",
            accuracy.overall_accuracy * 100.0,
            accuracy.successful_predictions,
            accuracy.total_predictions,
            format_score(accuracy.success_threshold, 2)
        );
    }
}

fn write_quality_artifacts(
    dir: &Path,
    stamp: &str,
    quality: &DataQualityReport,
) -> Result<(), AppError> {
    fs::write(
        dir.join(format!("data_quality_report_{stamp}.txt")),
        render_quality_report(quality),
    )?;
    serde_json::to_writer_pretty(
        File::create(dir.join(format!("data_quality_report_{stamp}.json")))?,
        quality,
    )?;
    Ok(())
}
