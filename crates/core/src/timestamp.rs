use chrono::NaiveDateTime;

use crate::domain::Timestamp;
use crate::errors::DomainError;

const ACCEPTED_FORMATS: [&str; 4] =
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

pub const DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a local wall-clock timestamp such as `2025-06-02T10:00`.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, DomainError> {
    let trimmed = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| DomainError::InvalidTimestamp(trimmed.to_string()))
}

pub fn format_timestamp(value: Timestamp) -> String {
    value.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{format_timestamp, parse_timestamp};
    use crate::errors::DomainError;

    #[test]
    fn accepts_t_and_space_separators() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 2)
            .and_then(|date| date.and_hms_opt(10, 0, 0))
            .expect("valid timestamp");

        assert_eq!(parse_timestamp("2025-06-02T10:00"), Ok(expected));
        assert_eq!(parse_timestamp("2025-06-02 10:00:00"), Ok(expected));
        assert_eq!(format_timestamp(expected), "2025-06-02T10:00:00");
    }

    #[test]
    fn rejects_dates_without_time() {
        assert_eq!(
            parse_timestamp("2025-06-02"),
            Err(DomainError::InvalidTimestamp("2025-06-02".to_string()))
        );
    }
}
