use digsafe_core::config::LoadOptions;
use digsafe_core::{
    format_timestamp, parse_timestamp, ApplicationError, ComplianceClockService, DigStartEvent,
    TicketSnapshot,
};
use serde_json::json;

use super::{load_context, parse_optional_timestamp, CommandResult};

const COMMAND: &str = "ics";

#[derive(Clone, Debug, Default)]
pub struct IcsRequest {
    pub ticket_number: String,
    pub filed_at: String,
    pub meet: bool,
    pub meet_held_at: Option<String>,
    pub work_to_begin_at: Option<String>,
    pub site: Option<String>,
    pub instructions: Option<String>,
}

pub fn run(options: &LoadOptions, request: &IcsRequest) -> CommandResult {
    match build_event(options, request) {
        Ok(event) => CommandResult::success_with_data(
            COMMAND,
            format!(
                "dig start for {} at {}",
                event.ticket_number,
                format_timestamp(event.starts_at)
            ),
            json!({
                "ticket_number": event.ticket_number,
                "starts_at": event.starts_at,
                "ends_at": event.ends_at(),
                "ics": event.to_ics(),
            }),
        ),
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

fn build_event(
    options: &LoadOptions,
    request: &IcsRequest,
) -> Result<DigStartEvent, ApplicationError> {
    let filed_at = parse_timestamp(&request.filed_at)?;
    let meet_held_at = parse_optional_timestamp(request.meet_held_at.as_deref())?;
    let work_to_begin_at = parse_optional_timestamp(request.work_to_begin_at.as_deref())?;

    let mut ticket = if request.meet || meet_held_at.is_some() {
        TicketSnapshot::meet(request.ticket_number.trim(), filed_at)
    } else {
        TicketSnapshot::normal(request.ticket_number.trim(), filed_at)
    };
    if let Some(meet_held_at) = meet_held_at {
        ticket.record_meet(meet_held_at)?;
    }
    if let Some(work_to_begin_at) = work_to_begin_at {
        ticket = ticket.with_work_to_begin_at(work_to_begin_at);
    }

    let context = load_context(options)?;
    let service = ComplianceClockService::new(&context.holidays);
    let event = service.dig_start_event(
        &ticket,
        request.site.as_deref(),
        request.instructions.as_deref(),
    )?;

    tracing::info!(
        event_name = "cli.ics.rendered",
        ticket = %ticket.ticket_number,
        starts_at = %event.starts_at,
        "dig start event rendered"
    );
    Ok(event)
}
