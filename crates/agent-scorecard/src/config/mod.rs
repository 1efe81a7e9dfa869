use crate::workflows::performance::GoalTargets;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub output: OutputConfig,
    pub scoring: ScoringConfig,
    pub linkage: LinkageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = env::var("APP_LOG_FORMAT")
            .map(|value| LogFormat::from_str(&value))
            .unwrap_or(LogFormat::Compact);

        let processed_dir = env::var("SCORECARD_PROCESSED_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/processed"));
        let reports_dir = env::var("SCORECARD_REPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("reports"));

        let top_n = env_or("SCORECARD_TOP_N", ScoringConfig::DEFAULT_TOP_N)?;
        if top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }

        let defaults = GoalTargets::default();
        let goals = GoalTargets {
            talk_secs: env_or("SCORECARD_GOAL_TALK_SECS", defaults.talk_secs)?,
            hold_secs: env_or("SCORECARD_GOAL_HOLD_SECS", defaults.hold_secs)?,
            acw_secs: env_or("SCORECARD_GOAL_ACW_SECS", defaults.acw_secs)?,
            aht_secs: env_or("SCORECARD_GOAL_AHT_SECS", defaults.aht_secs)?,
        };

        let client_ids = match env::var("SCORECARD_CLIENT_IDS") {
            Ok(raw) => parse_client_ids(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level, format },
            output: OutputConfig {
                processed_dir,
                reports_dir,
            },
            scoring: ScoringConfig { top_n, goals },
            linkage: LinkageConfig { client_ids },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Line layout of log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "verbose" => Self::Full,
            _ => Self::Compact,
        }
    }
}

/// Where generated artifacts land.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub processed_dir: PathBuf,
    pub reports_dir: PathBuf,
}

/// Ranking size and the daily duration targets behind the goal-met flags.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub top_n: usize,
    pub goals: GoalTargets,
}

impl ScoringConfig {
    pub const DEFAULT_TOP_N: usize = 5;
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_n: Self::DEFAULT_TOP_N,
            goals: GoalTargets::default(),
        }
    }
}

/// Applicant filter criteria used when linking performers to applications.
#[derive(Debug, Clone, Default)]
pub struct LinkageConfig {
    pub client_ids: Vec<i64>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    InvalidTopN,
    InvalidClientId { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{} has an invalid value '{}'", key, value)
            }
            ConfigError::InvalidTopN => write!(f, "SCORECARD_TOP_N must be at least 1"),
            ConfigError::InvalidClientId { value } => {
                write!(f, "SCORECARD_CLIENT_IDS contains a non-numeric id '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_client_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value.parse::<i64>().map_err(|_| ConfigError::InvalidClientId {
                value: value.to_string(),
            })
        })
        .collect()
}

/// Serializes tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    use std::sync::{Mutex, OnceLock};
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "SCORECARD_PROCESSED_DIR",
            "SCORECARD_REPORTS_DIR",
            "SCORECARD_TOP_N",
            "SCORECARD_CLIENT_IDS",
            "SCORECARD_GOAL_TALK_SECS",
            "SCORECARD_GOAL_HOLD_SECS",
            "SCORECARD_GOAL_ACW_SECS",
            "SCORECARD_GOAL_AHT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.output.processed_dir, PathBuf::from("data/processed"));
        assert_eq!(config.output.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.scoring.top_n, 5);
        assert_eq!(config.scoring.goals.aht_secs, 330.0);
        assert!(config.linkage.client_ids.is_empty());
    }

    #[test]
    fn parses_client_ids_and_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        env::set_var("APP_LOG_FORMAT", "Full");
        env::set_var("SCORECARD_CLIENT_IDS", "53, 625,,623");
        env::set_var("SCORECARD_TOP_N", "3");
        env::set_var("SCORECARD_GOAL_HOLD_SECS", "12.5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.telemetry.format, LogFormat::Full);
        assert_eq!(config.linkage.client_ids, vec![53, 625, 623]);
        assert_eq!(config.scoring.top_n, 3);
        assert_eq!(config.scoring.goals.hold_secs, 12.5);
        reset_env();
    }

    #[test]
    fn rejects_zero_top_n_and_bad_client_ids() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORECARD_TOP_N", "0");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidTopN)));

        reset_env();
        env::set_var("SCORECARD_CLIENT_IDS", "53,abc");
        match AppConfig::load() {
            Err(err @ ConfigError::InvalidClientId { .. }) => assert_eq!(
                err.to_string(),
                "SCORECARD_CLIENT_IDS contains a non-numeric id 'abc'"
            ),
            other => panic!("expected client id error, got {other:?}"),
        }
        reset_env();
    }
}
