use digsafe_core::config::{AppConfig, LoadOptions};
use digsafe_core::{
    parse_timestamp, ApplicationError, ComplianceClockService, DomainError, NoHolidays,
    ResponseStatus, UtilityResponse,
};

use super::CommandResult;

const COMMAND: &str = "readiness";

pub fn run(options: &LoadOptions, responses: &[String]) -> CommandResult {
    // Readiness never touches the calendar, but a broken config is still reported.
    if let Err(error) = AppConfig::load(options.clone()) {
        return CommandResult::from_error(COMMAND, ApplicationError::from(error));
    }

    let parsed = match parse_responses(responses) {
        Ok(parsed) => parsed,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };

    let service = ComplianceClockService::new(NoHolidays);
    let verdict = service.compute_readiness(&parsed);
    let report = service.readiness_report(&parsed);

    CommandResult::success_with_report(
        COMMAND,
        format!("{}: {}", verdict.banner(), verdict.detail()),
        &report,
    )
}

/// Parses `Utility=Status[@timestamp]` pairs such as `Xcel Energy=Marked` or
/// `Lumen=Clear@2025-06-04T09:00`.
pub fn parse_responses(raw: &[String]) -> Result<Vec<UtilityResponse>, ApplicationError> {
    raw.iter().map(|entry| parse_response(entry)).collect()
}

fn parse_response(entry: &str) -> Result<UtilityResponse, ApplicationError> {
    let malformed = || DomainError::MalformedResponse(entry.trim().to_string());
    let (utility, status) = entry.rsplit_once('=').ok_or_else(malformed)?;

    let utility = utility.trim();
    if utility.is_empty() {
        return Err(malformed().into());
    }

    let (status, responded_at) = match status.split_once('@') {
        Some((status, responded_at)) => (status, Some(parse_timestamp(responded_at)?)),
        None => (status, None),
    };

    let status: ResponseStatus = status.parse()?;
    let response = UtilityResponse::new(utility, status);
    Ok(match responded_at {
        Some(responded_at) => response.responded_at(responded_at),
        None => response,
    })
}
