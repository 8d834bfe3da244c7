pub mod config;
pub mod deadlines;
pub mod doctor;
pub mod holidays;
pub mod ics;
pub mod readiness;

use digsafe_core::config::{AppConfig, LoadOptions};
use digsafe_core::{ApplicationError, HolidaySet, Timestamp};
use serde::Serialize;
use serde_json::Value;

pub const EXIT_INTERNAL: u8 = 1;
pub const EXIT_CONFIG_FAILURE: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    data: Value,
}

impl CommandResult {
    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            hint: None,
            correlation_id: None,
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_report<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        report: &T,
    ) -> Self {
        match serde_json::to_value(report) {
            Ok(data) => Self::success_with_data(command, message, data),
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_INTERNAL),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_data(command, error_class, message, exit_code, Value::Null)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Value,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            hint: None,
            correlation_id: None,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps an application failure onto the CLI's error classes and exit codes.
    /// The payload carries the interface tier's user-facing hint and a
    /// correlation id that also tags the log event.
    pub fn from_error(command: &str, error: ApplicationError) -> Self {
        let (error_class, exit_code) = match &error {
            ApplicationError::Domain(_) => ("invalid_input", EXIT_INVALID_INPUT),
            ApplicationError::Calendar(_) => ("holiday_calendar", EXIT_CONFIG_FAILURE),
            ApplicationError::Configuration(_) => ("config_validation", EXIT_CONFIG_FAILURE),
        };

        let interface = error.into_interface(format!("{command}-{}", std::process::id()));
        tracing::warn!(
            event_name = "cli.command.failed",
            command,
            error_class,
            correlation_id = interface.correlation_id(),
            error = interface.detail(),
            "command failed"
        );

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: interface.detail().to_string(),
            hint: Some(interface.user_message().to_string()),
            correlation_id: Some(interface.correlation_id().to_string()),
            data: Value::Null,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Configuration plus the holiday calendar it points at.
pub struct CommandContext {
    pub config: AppConfig,
    pub holidays: HolidaySet,
}

pub fn load_context(options: &LoadOptions) -> Result<CommandContext, ApplicationError> {
    let config = AppConfig::load(options.clone())?;
    let holidays = config.holiday_set()?;
    tracing::debug!(
        event_name = "cli.context.loaded",
        jurisdiction = %config.calendar.jurisdiction,
        holidays = holidays.len(),
        "command context loaded"
    );
    Ok(CommandContext { config, holidays })
}

pub fn parse_optional_timestamp(
    value: Option<&str>,
) -> Result<Option<Timestamp>, ApplicationError> {
    value.map(digsafe_core::parse_timestamp).transpose().map_err(ApplicationError::from)
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\",\"data\":null}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
