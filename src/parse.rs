use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::error::ConfigError;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MONITOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "/app/config.json";

pub const DEFAULT_INTERVAL_SECONDS: u64 = 5;
/// Longer intervals are clamped; the tick deadline must stay representable.
pub const MAX_INTERVAL_SECONDS: u64 = 24 * 60 * 60;
pub const DEFAULT_MAX_FAILURES: u32 = 1;

// On-disk shape. Integers stay signed so that zero and negative values
// coerce to their defaults instead of failing to parse.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "app_command")]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    check_url: String,
    #[serde(default)]
    interval_seconds: i64,
    #[serde(default)]
    log_file: Option<String>,
    #[serde(default)]
    max_failures_before_restart: i64,
}

/// Startup parameters. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: String,
    pub args: Vec<String>,
    pub check_url: String,
    pub interval_seconds: u64,
    /// `None` means log to stdout.
    pub log_file: Option<PathBuf>,
    pub max_failures_before_restart: u32,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.min(MAX_INTERVAL_SECONDS))
    }
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let interval_seconds = u64::try_from(raw.interval_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_INTERVAL_SECONDS, |secs| secs.min(MAX_INTERVAL_SECONDS));

        let max_failures_before_restart = u32::try_from(raw.max_failures_before_restart)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_FAILURES);

        let log_file = raw
            .log_file
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Config {
            command: raw.command,
            args: raw.args,
            check_url: raw.check_url,
            interval_seconds,
            log_file,
            max_failures_before_restart,
        }
    }
}

/*
    @@@
    @config_path();
    . Takes the config location from MONITOR_CONFIG.
    . Falls back to /app/config.json when the variable is unset or empty.
*/
pub fn config_path() -> PathBuf {
    resolve_config_path(env::var(CONFIG_ENV).ok())
}

fn resolve_config_path(from_env: Option<String>) -> PathBuf {
    match from_env {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/*
    @@@
    @parser();
    . Reads the config file into a String. Any I/O error is returned as ConfigError::Read.
    . Hands the raw text to serde_yaml (JSON is accepted as-is) and coerces the numeric fields to their defaults when ≤0.
*/
pub fn parser(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_str(content: &str) -> Result<Config, serde_yaml::Error> {
    let raw: RawConfig = serde_yaml::from_str(content)?;
    Ok(raw.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn json_config_with_original_keys() {
        let cfg = parse_str(
            r#"{
                "app_command": "/app/app",
                "check_url": "http://localhost:8080/health",
                "interval_seconds": 10,
                "log_file": "/var/log/monitor.log",
                "max_failures_before_restart": 3
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.command, "/app/app");
        assert!(cfg.args.is_empty());
        assert_eq!(cfg.check_url, "http://localhost:8080/health");
        assert_eq!(cfg.interval(), Duration::from_secs(10));
        assert_eq!(cfg.log_file, Some(PathBuf::from("/var/log/monitor.log")));
        assert_eq!(cfg.max_failures_before_restart, 3);
    }

    #[test]
    fn yaml_config_with_args() {
        let cfg = parse_str(
            "command: sleep\nargs: [\"30\"]\ncheck_url: http://127.0.0.1:9000/\n",
        )
        .unwrap();

        assert_eq!(cfg.command, "sleep");
        assert_eq!(cfg.args, vec!["30".to_string()]);
        assert_eq!(cfg.log_file, None);
    }

    #[test]
    fn zero_interval_defaults_to_five() {
        let cfg = parse_str(r#"{"command": "x", "check_url": "u", "interval_seconds": 0}"#).unwrap();
        assert_eq!(cfg.interval_seconds, 5);
    }

    #[test]
    fn non_positive_numbers_are_coerced() {
        let cfg = parse_str(
            r#"{"command": "x", "check_url": "u", "interval_seconds": -3, "max_failures_before_restart": -1}"#,
        )
        .unwrap();
        assert_eq!(cfg.interval_seconds, DEFAULT_INTERVAL_SECONDS);
        assert_eq!(cfg.max_failures_before_restart, DEFAULT_MAX_FAILURES);
    }

    #[test]
    fn huge_interval_is_capped() {
        let cfg = parse_str(
            r#"{"command": "x", "check_url": "u", "interval_seconds": 9223372036854775807}"#,
        )
        .unwrap();
        assert_eq!(cfg.interval_seconds, MAX_INTERVAL_SECONDS);
        assert_eq!(cfg.interval(), Duration::from_secs(MAX_INTERVAL_SECONDS));
    }

    #[test]
    fn interval_getter_clamps_hand_built_config() {
        let mut cfg = parse_str(r#"{"command": "x", "check_url": "u"}"#).unwrap();
        cfg.interval_seconds = u64::MAX;
        assert_eq!(cfg.interval(), Duration::from_secs(MAX_INTERVAL_SECONDS));
    }

    #[test]
    fn missing_numbers_use_defaults() {
        let cfg = parse_str(r#"{"command": "x", "check_url": "u"}"#).unwrap();
        assert_eq!(cfg.interval_seconds, 5);
        assert_eq!(cfg.max_failures_before_restart, 1);
    }

    #[test]
    fn empty_log_file_means_stdout() {
        let cfg = parse_str(r#"{"command": "x", "check_url": "u", "log_file": ""}"#).unwrap();
        assert_eq!(cfg.log_file, None);
    }

    #[test]
    fn missing_command_is_rejected() {
        assert!(parse_str(r#"{"check_url": "u"}"#).is_err());
    }

    #[test]
    fn parser_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"command": "/bin/app", "check_url": "http://x/"}}"#).unwrap();

        let cfg = parser(file.path()).unwrap();
        assert_eq!(cfg.command, "/bin/app");
    }

    #[test]
    fn parser_reports_missing_file() {
        let err = parser(Path::new("/nonexistent/monitor.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn parser_reports_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = parser(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn config_path_fallback() {
        assert_eq!(resolve_config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(resolve_config_path(Some(String::new())), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(
            resolve_config_path(Some("/etc/monitor.yml".into())),
            PathBuf::from("/etc/monitor.yml")
        );
    }
}
