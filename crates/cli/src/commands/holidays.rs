use digsafe_core::config::LoadOptions;
use digsafe_core::Holiday;
use serde::Serialize;

use super::{load_context, CommandResult};

const COMMAND: &str = "holidays";

#[derive(Debug, Serialize)]
struct HolidayListing {
    jurisdiction: String,
    year: Option<i32>,
    count: usize,
    holidays: Vec<Holiday>,
}

pub fn run(options: &LoadOptions, year: Option<i32>) -> CommandResult {
    let context = match load_context(options) {
        Ok(context) => context,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };

    let holidays: Vec<Holiday> = match year {
        Some(year) => context.holidays.in_year(year),
        None => context.holidays.iter().collect(),
    };

    let scope = year.map(|year| format!(" in {year}")).unwrap_or_default();
    let message = format!(
        "{} holidays configured for {}{scope}",
        holidays.len(),
        context.config.calendar.jurisdiction
    );

    let listing = HolidayListing {
        jurisdiction: context.config.calendar.jurisdiction,
        year,
        count: holidays.len(),
        holidays,
    };
    CommandResult::success_with_report(COMMAND, message, &listing)
}
