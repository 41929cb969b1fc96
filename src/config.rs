//! Configuration loader and validator for the worship-team backend.
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::jobs::JobTiming;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub jobs: Jobs,
    #[serde(default)]
    pub mail: Mail,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    pub bind_addr: String,
    /// Front-end origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// How service dates are computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    /// Offset of the congregation's local time from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            utc_offset_minutes: -180,
        }
    }
}

/// Periodic jobs and when they fire (`"HH:MM"` or `"<weekday> HH:MM"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jobs {
    pub enabled: bool,
    pub birthday: String,
    pub music_reminder: String,
    pub playlist_reset: String,
}

impl Default for Jobs {
    fn default() -> Self {
        Self {
            enabled: true,
            birthday: "08:00".into(),
            music_reminder: "sat 10:00".into(),
            playlist_reset: "mon 00:05".into(),
        }
    }
}

/// Outbound mail relay. Without an endpoint mail is only logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mail {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

impl Default for Mail {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            from: "escala@localhost".into(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// `DATABASE_URL` when set, else a database file under `app.data_dir`.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "sqlite://{}/worship.db",
                self.app.data_dir.trim_end_matches('/')
            )
        })
    }

    pub fn utc_offset(&self) -> FixedOffset {
        // validate() keeps the offset within range; fall back to UTC otherwise.
        FixedOffset::east_opt(self.schedule.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::Invalid("app.bind_addr must be host:port"));
    }
    if cfg.app.allowed_origins.iter().any(|o| o.trim().is_empty()) {
        return Err(ConfigError::Invalid("app.allowed_origins entries must be non-empty"));
    }

    if cfg.schedule.utc_offset_minutes.abs() >= 24 * 60 {
        return Err(ConfigError::Invalid("schedule.utc_offset_minutes must be within one day"));
    }

    if cfg.jobs.birthday.parse::<JobTiming>().is_err() {
        return Err(ConfigError::Invalid("jobs.birthday is not a valid timing"));
    }
    if cfg.jobs.music_reminder.parse::<JobTiming>().is_err() {
        return Err(ConfigError::Invalid("jobs.music_reminder is not a valid timing"));
    }
    if cfg.jobs.playlist_reset.parse::<JobTiming>().is_err() {
        return Err(ConfigError::Invalid("jobs.playlist_reset is not a valid timing"));
    }

    if cfg.mail.from.trim().is_empty() {
        return Err(ConfigError::Invalid("mail.from must be non-empty"));
    }
    if let Some(endpoint) = &cfg.mail.endpoint {
        if reqwest::Url::parse(endpoint).is_err() {
            return Err(ConfigError::Invalid("mail.endpoint must be a valid url"));
        }
    }

    Ok(())
}

/// Example configuration, also used by the tests.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  bind_addr: "0.0.0.0:3000"
  allowed_origins:
    - "http://localhost:5173"

schedule:
  utc_offset_minutes: -180

jobs:
  enabled: true
  birthday: "08:00"
  music_reminder: "sat 10:00"
  playlist_reset: "mon 00:05"

mail:
  endpoint: "https://mail.example.org/v1/send"
  api_key: "YOUR_MAIL_RELAY_KEY"
  from: "escala@example.org"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.utc_offset(), FixedOffset::west_opt(3 * 3600).unwrap());
    }

    #[test]
    fn optional_sections_default() {
        let cfg: Config = serde_yaml::from_str(
            "app:\n  data_dir: \"./data\"\n  bind_addr: \"127.0.0.1:3000\"\n",
        )
        .unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.jobs, Jobs::default());
        assert_eq!(cfg.mail.endpoint, None);
        assert!(cfg.app.allowed_origins.is_empty());
    }

    #[test]
    fn invalid_bind_addr() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.bind_addr = "localhost".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("app.bind_addr")), _ => panic!("wrong error") }
    }

    #[test]
    fn invalid_job_timings() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.jobs.music_reminder = "someday 10:00".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("music_reminder")), _ => panic!("wrong error") }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.jobs.birthday = "25:00".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_offset_and_mail() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.schedule.utc_offset_minutes = 24 * 60;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.mail.endpoint = Some("nope".into());
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("mail.endpoint")), _ => panic!("wrong error") }
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.app.allowed_origins, vec!["http://localhost:5173".to_string()]);
        assert_eq!(cfg.jobs.playlist_reset, "mon 00:05");
    }
}
