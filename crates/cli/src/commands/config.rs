use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use digsafe_core::config::{resolve_config_path, AppConfig, LoadOptions};
use digsafe_core::ApplicationError;
use serde::Serialize;
use toml::Value;

use super::CommandResult;

const COMMAND: &str = "config";

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, ApplicationError::from(error)),
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let attribution = Attribution {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path,
    };
    let overrides = &options.overrides;

    let holidays = config
        .calendar
        .holidays
        .iter()
        .map(|date| date.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let holiday_file = config
        .calendar
        .holiday_file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let entries = vec![
        attribution.entry(
            "calendar.jurisdiction",
            config.calendar.jurisdiction.clone(),
            &["DIGSAFE_CALENDAR_JURISDICTION"],
            overrides.jurisdiction.is_some(),
        ),
        attribution.entry(
            "calendar.holidays",
            if holidays.is_empty() { "<none>".to_string() } else { holidays },
            &["DIGSAFE_CALENDAR_HOLIDAYS"],
            false,
        ),
        attribution.entry(
            "calendar.holiday_file",
            holiday_file,
            &["DIGSAFE_CALENDAR_HOLIDAY_FILE"],
            overrides.holiday_file.is_some(),
        ),
        attribution.entry(
            "rules.expiring_soon_hours",
            config.rules.expiring_soon_hours.to_string(),
            &["DIGSAFE_RULES_EXPIRING_SOON_HOURS"],
            overrides.expiring_soon_hours.is_some(),
        ),
        attribution.entry(
            "logging.level",
            config.logging.level.clone(),
            &["DIGSAFE_LOGGING_LEVEL", "DIGSAFE_LOG_LEVEL"],
            overrides.log_level.is_some(),
        ),
        attribution.entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["DIGSAFE_LOGGING_FORMAT", "DIGSAFE_LOG_FORMAT"],
            false,
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    lines.extend(entries.iter().map(render_line));

    CommandResult::success_with_report(COMMAND, lines.join("\n"), &entries)
}

struct Attribution {
    doc: Option<Value>,
    path: Option<PathBuf>,
}

impl Attribution {
    fn entry(
        &self,
        key: &'static str,
        value: String,
        env_keys: &[&str],
        overridden: bool,
    ) -> ConfigEntry {
        ConfigEntry { key, value, source: self.source(key, env_keys, overridden) }
    }

    fn source(&self, key_path: &str, env_keys: &[&str], overridden: bool) -> String {
        if overridden {
            return "flag".to_string();
        }

        if let Some(env_key) = env_keys.iter().find(|key| is_set(key)) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn is_set(key: &str) -> bool {
    env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(entry: &ConfigEntry) -> String {
    format!("- {} = {} (source: {})", entry.key, entry.value, entry.source)
}
