use digsafe_core::config::LoadOptions;
use digsafe_core::expiration::{days_until_expiration, hours_remaining};
use digsafe_core::{
    format_timestamp, parse_timestamp, ApplicationError, ComplianceClockService,
    DerivedTimestamps, ExpirationStatus, TicketWindow, Timestamp,
};
use serde::Serialize;

use super::{load_context, parse_optional_timestamp, CommandResult};

const COMMAND: &str = "deadlines";

#[derive(Clone, Debug, Default)]
pub struct DeadlinesRequest {
    pub filed_at: String,
    pub meet_held_at: Option<String>,
    pub now: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeadlinesReport {
    filed_at: Timestamp,
    meet_held_at: Option<Timestamp>,
    #[serde(flatten)]
    deadlines: DerivedTimestamps,
    expiration: Option<ExpirationReport>,
}

#[derive(Debug, Serialize)]
struct ExpirationReport {
    now: Timestamp,
    status: ExpirationStatus,
    hours_remaining: i64,
    days_remaining: i64,
}

pub fn run(options: &LoadOptions, request: &DeadlinesRequest) -> CommandResult {
    match evaluate(options, request) {
        Ok(report) => {
            let message = format!(
                "locate ready at {}; ticket expires at {}",
                format_timestamp(report.deadlines.locate_ready_at),
                format_timestamp(report.deadlines.expires_at)
            );
            CommandResult::success_with_report(COMMAND, message, &report)
        }
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

fn evaluate(
    options: &LoadOptions,
    request: &DeadlinesRequest,
) -> Result<DeadlinesReport, ApplicationError> {
    let filed_at = parse_timestamp(&request.filed_at)?;
    let meet_held_at = parse_optional_timestamp(request.meet_held_at.as_deref())?;
    let now = parse_optional_timestamp(request.now.as_deref())?;

    let context = load_context(options)?;
    let service = ComplianceClockService::new(&context.holidays)
        .with_expiring_soon_hours(context.config.rules.expiring_soon_hours);

    let window = TicketWindow { filed_at, meet_held_at };
    let deadlines = service.compute_deadlines(&window);
    let expiration = now.map(|now| ExpirationReport {
        now,
        status: service.expiration_status(&window, now),
        hours_remaining: hours_remaining(deadlines.expires_at, now),
        days_remaining: days_until_expiration(deadlines.expires_at, now),
    });

    Ok(DeadlinesReport { filed_at, meet_held_at, deadlines, expiration })
}
