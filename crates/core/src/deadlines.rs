//! Statutory deadline arithmetic.
//!
//! The locate-ready and meet rules both count two business days, but they
//! anchor differently: the locate period ends at 00:01 on the day after the
//! second business day, while the meet wait ends on the second business day
//! at the meet's own time of day. Expiration is flat calendar arithmetic.

use chrono::{Days, NaiveTime, TimeDelta};

use crate::calendar::BusinessCalendar;
use crate::domain::Timestamp;

pub const LOCATE_PERIOD_BUSINESS_DAYS: u32 = 2;
pub const MEET_WAIT_BUSINESS_DAYS: u32 = 2;
pub const TICKET_LIFETIME_DAYS: u64 = 14;

/// 00:01, when the locate clock starts and ends.
pub fn locate_clock_time() -> NaiveTime {
    NaiveTime::MIN + TimeDelta::minutes(1)
}

/// Locate period starts the day after filing and runs two full business days;
/// locating is complete at 00:01 on the following calendar day.
pub fn calculate_locate_ready_at(
    filed_at: Timestamp,
    calendar: &BusinessCalendar<'_>,
) -> Timestamp {
    let second_business_day =
        calendar.nth_business_day_after(filed_at.date(), LOCATE_PERIOD_BUSINESS_DAYS);

    (second_business_day + Days::new(1)).and_time(locate_clock_time())
}

/// Excavation may begin two business days after the meet, at the same time of
/// day the meet was held.
pub fn calculate_excavation_earliest_from_meet(
    meet_held_at: Timestamp,
    calendar: &BusinessCalendar<'_>,
) -> Timestamp {
    calendar
        .nth_business_day_after(meet_held_at.date(), MEET_WAIT_BUSINESS_DAYS)
        .and_time(meet_held_at.time())
}

/// Tickets are valid for fourteen calendar days; weekends and holidays count.
pub fn calculate_ticket_expiration(start_time: Timestamp) -> Timestamp {
    start_time + Days::new(TICKET_LIFETIME_DAYS)
}
