pub mod calendar;
pub mod config;
pub mod deadlines;
pub mod domain;
pub mod errors;
pub mod expiration;
pub mod ics;
pub mod readiness;
pub mod service;
pub mod timestamp;

pub use calendar::{
    BusinessCalendar, CalendarError, Holiday, HolidayCalendar, HolidaySet, NoHolidays,
};
pub use deadlines::{
    calculate_excavation_earliest_from_meet, calculate_locate_ready_at, calculate_ticket_expiration,
};
pub use domain::response::{ResponseStatus, UtilityResponse};
pub use domain::ticket::{
    DerivedTimestamps, TicketKind, TicketNumber, TicketSnapshot, TicketWindow,
};
pub use domain::Timestamp;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use expiration::{ExpirationStatus, SweepEntry, SweepSummary};
pub use ics::DigStartEvent;
pub use readiness::{aggregate, ReadinessReport, ReadinessVerdict};
pub use service::{compute_deadlines_with, ComplianceClockService};
pub use timestamp::{format_timestamp, parse_timestamp};
