//! Run configuration parsed from environment variables.
//!
//! Every setting can be supplied through a `PAGEWRIGHT_`-prefixed environment
//! variable and overridden from the command line with
//! [`RunConfig::apply_overrides`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;

use crate::error::ConfigError;

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Per-step detail.
    Debug,
    /// Scenario outcomes and session setup.
    #[default]
    Info,
    /// Failures only.
    Warn,
    /// Errors only.
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

const DEFAULT_FEATURES_DIR: &str = "features";
const DEFAULT_STATE_DIR: &str = ".pagewright/state";
const DEFAULT_WORKERS: usize = 1;

/// Settings for one run.
///
/// # Environment Variables
///
/// - `PAGEWRIGHT_LOG_LEVEL`: trace, debug, info, warn or error
/// - `PAGEWRIGHT_FEATURES_DIR`: directory searched for `*.feature` files
/// - `PAGEWRIGHT_STATE_DIR`: directory holding per-role session state
/// - `PAGEWRIGHT_WORKERS`: scenarios run concurrently, at least 1
/// - `PAGEWRIGHT_TIMEOUT_SECS`: run deadline in seconds, 0 for none
/// - `PAGEWRIGHT_REGENERATE_STATE`: `true`/`1` to log every role in again
/// - `PAGEWRIGHT_BASE_URL`: URL page-object paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Directory searched for feature files.
    pub features_dir: Utf8PathBuf,
    /// Directory holding persisted session state.
    pub state_dir: Utf8PathBuf,
    /// Number of scenarios executed concurrently.
    pub workers: usize,
    /// Deadline for the whole run.
    pub run_timeout: Option<Duration>,
    /// Ignore persisted session state and log in again.
    pub regenerate_state: bool,
    /// Base URL of the application under test.
    pub base_url: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            features_dir: Utf8PathBuf::from(DEFAULT_FEATURES_DIR),
            state_dir: Utf8PathBuf::from(DEFAULT_STATE_DIR),
            workers: DEFAULT_WORKERS,
            run_timeout: None,
            regenerate_state: false,
            base_url: None,
        }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    /// Log level.
    pub log_level: Option<LogLevel>,
    /// Feature directory.
    pub features_dir: Option<Utf8PathBuf>,
    /// Session state directory.
    pub state_dir: Option<Utf8PathBuf>,
    /// Worker count.
    pub workers: Option<usize>,
    /// Run deadline in seconds; 0 clears it.
    pub timeout_secs: Option<u64>,
    /// Force session-state regeneration. Only ever switches it on.
    pub regenerate_state: bool,
    /// Base URL.
    pub base_url: Option<String>,
}

fn parse_workers(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(workers) if workers > 0 => Ok(workers),
        _ => Err(ConfigError::InvalidConfig(format!(
            "invalid worker count '{raw}', expected a positive integer"
        ))),
    }
}

fn parse_timeout(raw: &str) -> Result<Option<Duration>, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|_| {
        ConfigError::InvalidConfig(format!(
            "invalid timeout '{raw}', expected a whole number of seconds"
        ))
    })?;
    Ok(timeout_from_secs(secs))
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidConfig(format!(
            "invalid value '{raw}' for {name}, expected true or false"
        ))),
    }
}

impl RunConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if a variable holds an invalid
    /// value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if a variable holds an invalid
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(val) = lookup("PAGEWRIGHT_LOG_LEVEL") {
            config.log_level = val.parse()?;
        }
        if let Some(val) = lookup("PAGEWRIGHT_FEATURES_DIR") {
            config.features_dir = Utf8PathBuf::from(val);
        }
        if let Some(val) = lookup("PAGEWRIGHT_STATE_DIR") {
            config.state_dir = Utf8PathBuf::from(val);
        }
        if let Some(val) = lookup("PAGEWRIGHT_WORKERS") {
            config.workers = parse_workers(&val)?;
        }
        if let Some(val) = lookup("PAGEWRIGHT_TIMEOUT_SECS") {
            config.run_timeout = parse_timeout(&val)?;
        }
        if let Some(val) = lookup("PAGEWRIGHT_REGENERATE_STATE") {
            config.regenerate_state = parse_flag("PAGEWRIGHT_REGENERATE_STATE", &val)?;
        }
        if let Some(val) = lookup("PAGEWRIGHT_BASE_URL") {
            config.base_url = Some(val).filter(|url| !url.is_empty());
        }
        Ok(config)
    }

    /// Apply command-line overrides on top of environment-based values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` for a worker count of zero.
    pub fn apply_overrides(mut self, overrides: RunOverrides) -> Result<Self, ConfigError> {
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(dir) = overrides.features_dir {
            self.features_dir = dir;
        }
        if let Some(dir) = overrides.state_dir {
            self.state_dir = dir;
        }
        if let Some(workers) = overrides.workers {
            if workers == 0 {
                return Err(ConfigError::InvalidConfig(
                    "worker count must be at least 1".into(),
                ));
            }
            self.workers = workers;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.run_timeout = timeout_from_secs(secs);
        }
        if overrides.regenerate_state {
            self.regenerate_state = true;
        }
        if let Some(url) = overrides.base_url {
            self.base_url = Some(url);
        }
        Ok(self)
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;
    use rstest::rstest;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("DEBUG", LogLevel::Debug)]
    #[case("Info", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    fn log_level_parses_case_insensitively(#[case] raw: &str, #[case] expected: LogLevel) {
        assert_eq!(raw.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let Err(err) = "loud".parse::<LogLevel>() else {
            panic!("'loud' is not a level");
        };
        assert!(err.to_string().contains("unknown log level"));
    }

    #[test]
    fn defaults_apply_without_variables() {
        let Ok(config) = RunConfig::from_lookup(lookup(&[])) else {
            panic!("empty environment is valid");
        };
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.workers, 1);
        assert_eq!(config.features_dir, "features");
    }

    #[test]
    fn reads_every_variable() {
        let Ok(config) = RunConfig::from_lookup(lookup(&[
            ("PAGEWRIGHT_LOG_LEVEL", "debug"),
            ("PAGEWRIGHT_FEATURES_DIR", "specs"),
            ("PAGEWRIGHT_STATE_DIR", "/tmp/state"),
            ("PAGEWRIGHT_WORKERS", "4"),
            ("PAGEWRIGHT_TIMEOUT_SECS", "90"),
            ("PAGEWRIGHT_REGENERATE_STATE", "yes"),
            ("PAGEWRIGHT_BASE_URL", "https://www.saucedemo.com"),
        ])) else {
            panic!("environment should parse");
        };
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.features_dir, "specs");
        assert_eq!(config.state_dir, "/tmp/state");
        assert_eq!(config.workers, 4);
        assert_eq!(config.run_timeout, Some(Duration::from_secs(90)));
        assert!(config.regenerate_state);
        assert_eq!(config.base_url.as_deref(), Some("https://www.saucedemo.com"));
    }

    #[rstest]
    #[case("PAGEWRIGHT_WORKERS", "0")]
    #[case("PAGEWRIGHT_WORKERS", "many")]
    #[case("PAGEWRIGHT_TIMEOUT_SECS", "-5")]
    #[case("PAGEWRIGHT_REGENERATE_STATE", "maybe")]
    fn rejects_invalid_values(#[case] name: &str, #[case] value: &str) {
        assert!(matches!(
            RunConfig::from_lookup(lookup(&[(name, value)])),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn overrides_take_precedence() {
        let base = RunConfig {
            run_timeout: Some(Duration::from_secs(30)),
            ..RunConfig::default()
        };
        let Ok(config) = base.apply_overrides(RunOverrides {
            log_level: Some(LogLevel::Error),
            workers: Some(3),
            timeout_secs: Some(0),
            regenerate_state: true,
            ..RunOverrides::default()
        }) else {
            panic!("overrides are valid");
        };
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.workers, 3);
        assert_eq!(config.run_timeout, None);
        assert!(config.regenerate_state);
        assert_eq!(config.state_dir, DEFAULT_STATE_DIR);
    }

    #[test]
    fn zero_worker_override_is_rejected() {
        let result = RunConfig::default().apply_overrides(RunOverrides {
            workers: Some(0),
            ..RunOverrides::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn with_log_level_builder() {
        let config = RunConfig::default().with_log_level(LogLevel::Trace);
        assert_eq!(config.log_level, LogLevel::Trace);
    }
}
