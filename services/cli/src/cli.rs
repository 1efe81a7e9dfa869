use crate::commands::{run_clean, run_link, run_pipeline, CleanArgs, LinkArgs, RunArgs};
use agent_scorecard::config::AppConfig;
use agent_scorecard::error::AppError;
use agent_scorecard::telemetry;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "agent-scorecard",
    about = "Clean call-center performance exports, rank agents, and link top performers to applicants",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline: clean, semantic transform, aggregate, rank, report
    Run(RunArgs),
    /// Clean an export and write the cleaned CSV plus its data-quality report
    Clean(CleanArgs),
    /// Link performers from an export to applicant records that predate their first day
    Link(LinkArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Run(args) => run_pipeline(&config, args),
        Command::Clean(args) => run_clean(&config, args),
        Command::Link(args) => run_link(&config, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("agent-scorecard").chain(args.iter().copied()))
    }

    #[test]
    fn run_rejects_zero_top_n() {
        assert!(parse(&["run", "--input", "export.csv", "--top-n", "0"]).is_err());
        match parse(&["run", "--input", "export.csv", "--top-n", "3"]) {
            Ok(Cli {
                command: Command::Run(args),
            }) => assert_eq!(args.top_n, Some(3)),
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn link_requires_an_applicant_source() {
        assert!(parse(&["link", "--input", "export.csv"]).is_err());
        assert!(parse(&[
            "link",
            "--input",
            "export.csv",
            "--applicants-csv",
            "a.csv",
            "--applicants-db",
            "a.db"
        ])
        .is_err());
        assert!(parse(&["link", "--input", "export.csv", "--applicants-db", "a.db"]).is_ok());
    }
}
