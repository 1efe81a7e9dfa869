mod cli;
mod commands;
mod infra;

use agent_scorecard::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
