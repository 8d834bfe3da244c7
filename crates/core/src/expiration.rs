use serde::{Deserialize, Serialize};

use crate::domain::ticket::TicketNumber;
use crate::domain::Timestamp;

pub const DEFAULT_EXPIRING_SOON_HOURS: i64 = 48;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationStatus {
    Active,
    ExpiringSoon,
    Expired,
}

/// Whole hours left before `expires_at`, truncated toward zero.
pub fn hours_remaining(expires_at: Timestamp, now: Timestamp) -> i64 {
    (expires_at - now).num_hours()
}

/// Days left before `expires_at`, rounded up. Negative once expired.
pub fn days_until_expiration(expires_at: Timestamp, now: Timestamp) -> i64 {
    let seconds = (expires_at - now).num_seconds();
    -(-seconds).div_euclid(SECONDS_PER_DAY)
}

pub fn expiration_status(
    expires_at: Timestamp,
    now: Timestamp,
    expiring_soon_hours: i64,
) -> ExpirationStatus {
    // Expired only once the expiry instant is reached; a sub-hour remainder
    // reports zero hours but is still expiring soon.
    if now >= expires_at {
        ExpirationStatus::Expired
    } else if hours_remaining(expires_at, now) < expiring_soon_hours {
        ExpirationStatus::ExpiringSoon
    } else {
        ExpirationStatus::Active
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub ticket_number: TicketNumber,
    pub expires_at: Timestamp,
    pub hours_remaining: i64,
    pub status: ExpirationStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub active: usize,
    pub expiring_soon: usize,
    pub expired: usize,
    pub entries: Vec<SweepEntry>,
}

impl SweepSummary {
    pub fn from_entries(entries: Vec<SweepEntry>) -> Self {
        let count = |status: ExpirationStatus| {
            entries.iter().filter(|entry| entry.status == status).count()
        };

        Self {
            active: count(ExpirationStatus::Active),
            expiring_soon: count(ExpirationStatus::ExpiringSoon),
            expired: count(ExpirationStatus::Expired),
            entries,
        }
    }

    pub fn expired_tickets(&self) -> impl Iterator<Item = &TicketNumber> {
        self.entries
            .iter()
            .filter(|entry| entry.status == ExpirationStatus::Expired)
            .map(|entry| &entry.ticket_number)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        days_until_expiration, expiration_status, hours_remaining, ExpirationStatus,
        DEFAULT_EXPIRING_SOON_HOURS,
    };
    use crate::domain::Timestamp;

    fn ts(day: u32, hour: u32, minute: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn status_thresholds() {
        let expires = ts(15, 8, 0);

        assert_eq!(
            expiration_status(expires, ts(10, 8, 0), DEFAULT_EXPIRING_SOON_HOURS),
            ExpirationStatus::Active
        );
        assert_eq!(
            expiration_status(expires, ts(13, 8, 0), DEFAULT_EXPIRING_SOON_HOURS),
            ExpirationStatus::Active
        );
        assert_eq!(
            expiration_status(expires, ts(13, 8, 1), DEFAULT_EXPIRING_SOON_HOURS),
            ExpirationStatus::ExpiringSoon
        );
        assert_eq!(
            expiration_status(expires, ts(15, 7, 59), DEFAULT_EXPIRING_SOON_HOURS),
            ExpirationStatus::ExpiringSoon
        );
        assert_eq!(
            expiration_status(expires, ts(15, 8, 0), DEFAULT_EXPIRING_SOON_HOURS),
            ExpirationStatus::Expired
        );
    }

    #[test]
    fn final_half_hour_is_expiring_soon_not_expired() {
        let expires = ts(15, 8, 0);
        let now = ts(15, 7, 30);

        assert_eq!(hours_remaining(expires, now), 0);
        assert_eq!(
            expiration_status(expires, now, DEFAULT_EXPIRING_SOON_HOURS),
            ExpirationStatus::ExpiringSoon
        );
    }

    #[test]
    fn hours_truncate_toward_zero() {
        let expires = ts(15, 8, 0);

        assert_eq!(hours_remaining(expires, ts(15, 6, 30)), 1);
        assert_eq!(hours_remaining(expires, ts(15, 9, 30)), -1);
    }

    #[test]
    fn days_round_up() {
        let expires = ts(15, 8, 0);

        assert_eq!(days_until_expiration(expires, ts(10, 8, 0)), 5);
        assert_eq!(days_until_expiration(expires, ts(10, 9, 0)), 5);
        assert_eq!(days_until_expiration(expires, ts(15, 8, 0)), 0);
        assert_eq!(days_until_expiration(expires, ts(17, 9, 0)), -2);
    }
}
