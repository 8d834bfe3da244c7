use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{parse_iso_date, CalendarError, HolidaySet};

pub const DEFAULT_CONFIG_FILE: &str = "digsafe.toml";
pub const NESTED_CONFIG_FILE: &str = "config/digsafe.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub calendar: CalendarConfig,
    pub rules: RulesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub jurisdiction: String,
    pub holidays: Vec<NaiveDate>,
    pub holiday_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub expiring_soon_hours: i64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub jurisdiction: Option<String>,
    pub holiday_file: Option<PathBuf>,
    pub expiring_soon_hours: Option<i64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            calendar: CalendarConfig {
                jurisdiction: "MN".to_string(),
                holidays: Vec::new(),
                holiday_file: None,
            },
            rules: RulesConfig { expiring_soon_hours: 48 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch, path.parent())?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Builds the injected holiday calendar from inline dates plus the
    /// optional holiday file.
    pub fn holiday_set(&self) -> Result<HolidaySet, CalendarError> {
        let mut holidays = HolidaySet::from_dates(self.calendar.holidays.iter().copied());
        if let Some(path) = &self.calendar.holiday_file {
            holidays.merge(HolidaySet::load_file(path)?);
        }
        Ok(holidays)
    }

    fn apply_patch(
        &mut self,
        patch: ConfigPatch,
        base_dir: Option<&Path>,
    ) -> Result<(), ConfigError> {
        if let Some(calendar) = patch.calendar {
            if let Some(jurisdiction) = calendar.jurisdiction {
                self.calendar.jurisdiction = jurisdiction;
            }
            if let Some(holidays) = calendar.holidays {
                self.calendar.holidays = parse_holiday_list(&holidays).map_err(|error| {
                    ConfigError::Validation(format!("calendar.holidays: {error}"))
                })?;
            }
            if let Some(holiday_file) = calendar.holiday_file {
                self.calendar.holiday_file = Some(relative_to(base_dir, holiday_file));
            }
        }

        if let Some(rules) = patch.rules {
            if let Some(expiring_soon_hours) = rules.expiring_soon_hours {
                self.rules.expiring_soon_hours = expiring_soon_hours;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DIGSAFE_CALENDAR_JURISDICTION") {
            self.calendar.jurisdiction = value;
        }
        if let Some(value) = read_env("DIGSAFE_CALENDAR_HOLIDAYS") {
            let entries: Vec<String> = value.split(',').map(str::to_string).collect();
            self.calendar.holidays = parse_holiday_list(&entries).map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "DIGSAFE_CALENDAR_HOLIDAYS".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("DIGSAFE_CALENDAR_HOLIDAY_FILE") {
            self.calendar.holiday_file = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("DIGSAFE_RULES_EXPIRING_SOON_HOURS") {
            self.rules.expiring_soon_hours =
                parse_i64("DIGSAFE_RULES_EXPIRING_SOON_HOURS", &value)?;
        }

        let log_level = read_env("DIGSAFE_LOGGING_LEVEL").or_else(|| read_env("DIGSAFE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DIGSAFE_LOGGING_FORMAT").or_else(|| read_env("DIGSAFE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(jurisdiction) = overrides.jurisdiction {
            self.calendar.jurisdiction = jurisdiction;
        }
        if let Some(holiday_file) = overrides.holiday_file {
            self.calendar.holiday_file = Some(holiday_file);
        }
        if let Some(expiring_soon_hours) = overrides.expiring_soon_hours {
            self.rules.expiring_soon_hours = expiring_soon_hours;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_calendar(&self.calendar)?;
        validate_rules(&self.rules)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `AppConfig::load` reads, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn parse_holiday_list(values: &[String]) -> Result<Vec<NaiveDate>, CalendarError> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(parse_iso_date)
        .collect()
}

fn relative_to(base_dir: Option<&Path>, path: PathBuf) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() && !base.as_os_str().is_empty() => base.join(path),
        _ => path,
    }
}

fn validate_calendar(calendar: &CalendarConfig) -> Result<(), ConfigError> {
    if calendar.jurisdiction.trim().is_empty() {
        return Err(ConfigError::Validation(
            "calendar.jurisdiction must not be empty".to_string(),
        ));
    }

    if let Some(path) = &calendar.holiday_file {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "calendar.holiday_file must not be an empty path".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_rules(rules: &RulesConfig) -> Result<(), ConfigError> {
    if !(1..=336).contains(&rules.expiring_soon_hours) {
        return Err(ConfigError::Validation(
            "rules.expiring_soon_hours must be in range 1..=336".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    calendar: Option<CalendarPatch>,
    rules: Option<RulesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarPatch {
    jurisdiction: Option<String>,
    holidays: Option<Vec<String>>,
    holiday_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesPatch {
    expiring_soon_hours: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
