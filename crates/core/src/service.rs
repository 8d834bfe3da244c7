use rayon::prelude::*;
use tracing::{debug, info};

use crate::calendar::{BusinessCalendar, HolidayCalendar};
use crate::deadlines::{
    calculate_excavation_earliest_from_meet, calculate_locate_ready_at,
    calculate_ticket_expiration,
};
use crate::domain::response::UtilityResponse;
use crate::domain::ticket::{DerivedTimestamps, TicketKind, TicketSnapshot, TicketWindow};
use crate::domain::Timestamp;
use crate::errors::DomainError;
use crate::expiration::{
    expiration_status, hours_remaining, ExpirationStatus, SweepEntry, SweepSummary,
    DEFAULT_EXPIRING_SOON_HOURS,
};
use crate::ics::DigStartEvent;
use crate::readiness::{aggregate, ReadinessReport, ReadinessVerdict};

/// Derived timestamps for a ticket window against an explicit calendar.
pub fn compute_deadlines_with(
    ticket: &TicketWindow,
    calendar: &BusinessCalendar<'_>,
) -> DerivedTimestamps {
    DerivedTimestamps {
        locate_ready_at: calculate_locate_ready_at(ticket.filed_at, calendar),
        excavation_earliest_at: ticket
            .meet_held_at
            .map(|meet_held_at| calculate_excavation_earliest_from_meet(meet_held_at, calendar)),
        expires_at: calculate_ticket_expiration(ticket.filed_at),
    }
}

/// Stateless façade over the deadline and readiness rules. The holiday
/// calendar is the only injected dependency and is only ever read.
#[derive(Clone, Debug)]
pub struct ComplianceClockService<H> {
    holidays: H,
    expiring_soon_hours: i64,
}

impl<H> ComplianceClockService<H>
where
    H: HolidayCalendar,
{
    pub fn new(holidays: H) -> Self {
        Self { holidays, expiring_soon_hours: DEFAULT_EXPIRING_SOON_HOURS }
    }

    pub fn with_expiring_soon_hours(mut self, hours: i64) -> Self {
        self.expiring_soon_hours = hours;
        self
    }

    pub fn calendar(&self) -> BusinessCalendar<'_> {
        BusinessCalendar::new(&self.holidays)
    }

    pub fn compute_deadlines(&self, ticket: &TicketWindow) -> DerivedTimestamps {
        let deadlines = compute_deadlines_with(ticket, &self.calendar());
        debug!(
            event_name = "compliance.deadlines.computed",
            filed_at = %ticket.filed_at,
            locate_ready_at = %deadlines.locate_ready_at,
            has_meet = deadlines.excavation_earliest_at.is_some(),
            expires_at = %deadlines.expires_at,
            "ticket deadlines computed"
        );
        deadlines
    }

    /// Earliest excavation time after the meet; an error until the meet is logged.
    pub fn excavation_earliest(&self, ticket: &TicketSnapshot) -> Result<Timestamp, DomainError> {
        let meet_held_at = ticket.require_meet_held_at()?;
        Ok(calculate_excavation_earliest_from_meet(meet_held_at, &self.calendar()))
    }

    /// When digging may legally start, pushed back to the requested work start
    /// if that is later.
    pub fn legal_dig_start(&self, ticket: &TicketSnapshot) -> Result<Timestamp, DomainError> {
        let legal = match ticket.kind {
            TicketKind::Meet => self.excavation_earliest(ticket)?,
            TicketKind::Normal => {
                calculate_locate_ready_at(ticket.window.filed_at, &self.calendar())
            }
        };

        Ok(match ticket.work_to_begin_at {
            Some(requested) if requested > legal => requested,
            _ => legal,
        })
    }

    pub fn compute_readiness(&self, responses: &[UtilityResponse]) -> ReadinessVerdict {
        let verdict = aggregate(responses);
        debug!(
            event_name = "compliance.readiness.computed",
            responses = responses.len(),
            verdict = ?verdict,
            "readiness verdict computed"
        );
        verdict
    }

    pub fn readiness_report(&self, responses: &[UtilityResponse]) -> ReadinessReport {
        ReadinessReport::from_responses(responses)
    }

    pub fn expiration_status(&self, ticket: &TicketWindow, now: Timestamp) -> ExpirationStatus {
        expiration_status(
            calculate_ticket_expiration(ticket.filed_at),
            now,
            self.expiring_soon_hours,
        )
    }

    /// Classifies every ticket against `now`. Tickets are independent, so the
    /// work is spread across the rayon pool; output keeps input order.
    pub fn sweep(&self, tickets: &[TicketSnapshot], now: Timestamp) -> SweepSummary {
        let entries: Vec<SweepEntry> = tickets
            .par_iter()
            .map(|ticket| {
                let expires_at = calculate_ticket_expiration(ticket.window.filed_at);
                SweepEntry {
                    ticket_number: ticket.ticket_number.clone(),
                    expires_at,
                    hours_remaining: hours_remaining(expires_at, now),
                    status: expiration_status(expires_at, now, self.expiring_soon_hours),
                }
            })
            .collect();

        let summary = SweepSummary::from_entries(entries);
        info!(
            event_name = "compliance.sweep.completed",
            tickets = tickets.len(),
            active = summary.active,
            expiring_soon = summary.expiring_soon,
            expired = summary.expired,
            "expiration sweep completed"
        );
        summary
    }

    pub fn dig_start_event(
        &self,
        ticket: &TicketSnapshot,
        location: Option<&str>,
        instructions: Option<&str>,
    ) -> Result<DigStartEvent, DomainError> {
        Ok(DigStartEvent {
            ticket_number: ticket.ticket_number.0.clone(),
            starts_at: self.legal_dig_start(ticket)?,
            location: location.map(str::to_string),
            instructions: instructions.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::ComplianceClockService;
    use crate::calendar::{HolidaySet, NoHolidays};
    use crate::domain::response::{ResponseStatus, UtilityResponse};
    use crate::domain::ticket::{TicketSnapshot, TicketWindow};
    use crate::domain::Timestamp;
    use crate::errors::DomainError;
    use crate::expiration::ExpirationStatus;
    use crate::readiness::ReadinessVerdict;

    fn ts(month: u32, day: u32, hour: u32, minute: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2025, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    fn mn_summer() -> HolidaySet {
        HolidaySet::parse_iso_dates(["2025-06-19", "2025-07-04"]).expect("valid holidays")
    }

    #[test]
    fn computes_all_deadlines_for_meet_ticket() {
        let service = ComplianceClockService::new(mn_summer());
        let window = TicketWindow::filed(ts(6, 2, 10, 0)).with_meet(ts(6, 6, 14, 0));

        let deadlines = service.compute_deadlines(&window);

        assert_eq!(deadlines.locate_ready_at, ts(6, 5, 0, 1));
        assert_eq!(deadlines.excavation_earliest_at, Some(ts(6, 10, 14, 0)));
        assert_eq!(deadlines.expires_at, ts(6, 16, 10, 0));
    }

    #[test]
    fn normal_ticket_has_no_meet_deadline() {
        let service = ComplianceClockService::new(NoHolidays);
        let deadlines = service.compute_deadlines(&TicketWindow::filed(ts(6, 6, 14, 0)));

        assert_eq!(deadlines.locate_ready_at, ts(6, 11, 0, 1));
        assert_eq!(deadlines.excavation_earliest_at, None);
    }

    #[test]
    fn recomputation_is_stable() {
        let service = ComplianceClockService::new(mn_summer());
        let window = TicketWindow::filed(ts(7, 3, 10, 0)).with_meet(ts(7, 3, 15, 0));

        assert_eq!(service.compute_deadlines(&window), service.compute_deadlines(&window));
    }

    #[test]
    fn holiday_shifts_locate_ready() {
        let service = ComplianceClockService::new(mn_summer());
        let deadlines = service.compute_deadlines(&TicketWindow::filed(ts(6, 17, 9, 0)));

        // Wed 18 counts, Thu 19 is Juneteenth, Fri 20 counts.
        assert_eq!(deadlines.locate_ready_at, ts(6, 21, 0, 1));
    }

    #[test]
    fn meet_ticket_without_meet_is_invalid_state() {
        let service = ComplianceClockService::new(NoHolidays);
        let ticket = TicketSnapshot::meet("A251530003", ts(6, 2, 10, 0));

        let error = service.excavation_earliest(&ticket).expect_err("meet not logged");
        assert!(matches!(error, DomainError::InvalidTicketState { .. }));
        assert!(service.legal_dig_start(&ticket).is_err());
    }

    #[test]
    fn legal_dig_start_honours_later_requested_start() {
        let service = ComplianceClockService::new(NoHolidays);
        let early = TicketSnapshot::normal("A1", ts(6, 2, 10, 0));
        let late = early.clone().with_work_to_begin_at(ts(6, 9, 7, 0));
        let too_soon = early.clone().with_work_to_begin_at(ts(6, 3, 7, 0));

        assert_eq!(service.legal_dig_start(&early), Ok(ts(6, 5, 0, 1)));
        assert_eq!(service.legal_dig_start(&late), Ok(ts(6, 9, 7, 0)));
        assert_eq!(service.legal_dig_start(&too_soon), Ok(ts(6, 5, 0, 1)));
    }

    #[test]
    fn meet_ticket_dig_start_uses_meet_rule() {
        let service = ComplianceClockService::new(NoHolidays);
        let ticket =
            TicketSnapshot::meet("A2", ts(6, 2, 10, 0)).with_meet_held_at(ts(6, 6, 14, 0));

        let event = service
            .dig_start_event(&ticket, Some("County Rd 7"), None)
            .expect("meet is logged");
        assert_eq!(event.starts_at, ts(6, 10, 14, 0));
        assert_eq!(event.location.as_deref(), Some("County Rd 7"));
    }

    #[test]
    fn readiness_goes_through_service() {
        let service = ComplianceClockService::new(NoHolidays);
        let responses = vec![
            UtilityResponse::new("Xcel Energy", ResponseStatus::Marked),
            UtilityResponse::new("CenterPoint", ResponseStatus::Clear),
        ];

        assert_eq!(service.compute_readiness(&responses), ReadinessVerdict::Ready);
        assert_eq!(service.compute_readiness(&[]), ReadinessVerdict::Pending);
    }

    #[test]
    fn sweep_classifies_and_preserves_order() {
        let service = ComplianceClockService::new(Arc::new(mn_summer()));
        let tickets = vec![
            TicketSnapshot::normal("old", ts(5, 1, 8, 0)),
            TicketSnapshot::normal("closing", ts(5, 30, 8, 0)),
            TicketSnapshot::normal("fresh", ts(6, 10, 8, 0)),
        ];

        let summary = service.sweep(&tickets, ts(6, 12, 9, 0));

        let order: Vec<&str> =
            summary.entries.iter().map(|entry| entry.ticket_number.0.as_str()).collect();
        assert_eq!(order, vec!["old", "closing", "fresh"]);
        assert_eq!(summary.entries[0].status, ExpirationStatus::Expired);
        assert_eq!(summary.entries[1].status, ExpirationStatus::ExpiringSoon);
        assert_eq!(summary.entries[2].status, ExpirationStatus::Active);
        assert_eq!((summary.active, summary.expiring_soon, summary.expired), (1, 1, 1));
        assert_eq!(summary.expired_tickets().count(), 1);
    }

    #[test]
    fn expiring_soon_window_is_configurable() {
        let service = ComplianceClockService::new(NoHolidays).with_expiring_soon_hours(96);
        let window = TicketWindow::filed(ts(6, 1, 8, 0));

        assert_eq!(
            service.expiration_status(&window, ts(6, 12, 9, 0)),
            ExpirationStatus::ExpiringSoon
        );
    }
}
