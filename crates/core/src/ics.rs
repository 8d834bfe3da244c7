//! iCalendar export of a ticket's dig start.
//!
//! Times are written as floating local time (no `Z`, no `TZID`) because
//! [`Timestamp`] is already wall-clock time in the jurisdiction's zone.

use chrono::TimeDelta;

use crate::domain::Timestamp;

const ICS_DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const MAX_LINE_OCTETS: usize = 75;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigStartEvent {
    pub ticket_number: String,
    pub starts_at: Timestamp,
    pub location: Option<String>,
    pub instructions: Option<String>,
}

impl DigStartEvent {
    pub fn ends_at(&self) -> Timestamp {
        self.starts_at + TimeDelta::hours(1)
    }

    pub fn to_ics(&self) -> String {
        let mut description = format!("Ticket: {}", self.ticket_number);
        if let Some(location) = &self.location {
            description.push_str(&format!("\nAddress: {location}"));
        }
        if let Some(instructions) = &self.instructions {
            description.push_str(&format!("\nInstructions: {instructions}"));
        }

        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "PRODID:-//digsafe//dig ticket compliance//EN".to_string(),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}-dig-start@digsafe", escape_text(&self.ticket_number)),
            format!("DTSTART:{}", self.starts_at.format(ICS_DATE_TIME_FORMAT)),
            format!("DTEND:{}", self.ends_at().format(ICS_DATE_TIME_FORMAT)),
            format!("SUMMARY:811 Dig Start: {}", escape_text(&self.ticket_number)),
            format!("DESCRIPTION:{}", escape_text(&description)),
        ];
        if let Some(location) = &self.location {
            lines.push(format!("LOCATION:{}", escape_text(location)));
        }
        lines.push("END:VEVENT".to_string());
        lines.push("END:VCALENDAR".to_string());

        let mut output = String::new();
        for line in lines {
            output.push_str(&fold_line(&line));
            output.push_str("\r\n");
        }
        output
    }
}

pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

// Continuation lines start with a single space, which counts toward the limit.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut octets = 0;
    let mut limit = MAX_LINE_OCTETS;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if octets + width > limit {
            folded.push_str("\r\n ");
            octets = 0;
            limit = MAX_LINE_OCTETS - 1;
        }
        folded.push(ch);
        octets += width;
    }
    folded
}
