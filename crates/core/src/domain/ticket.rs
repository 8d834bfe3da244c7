use serde::{Deserialize, Serialize};

use crate::domain::Timestamp;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketNumber(pub String);

impl std::fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    #[default]
    Normal,
    Meet,
}

/// Timestamps that drive the statutory clocks of one ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketWindow {
    pub filed_at: Timestamp,
    pub meet_held_at: Option<Timestamp>,
}

impl TicketWindow {
    pub fn filed(filed_at: Timestamp) -> Self {
        Self { filed_at, meet_held_at: None }
    }

    pub fn with_meet(mut self, meet_held_at: Timestamp) -> Self {
        self.meet_held_at = Some(meet_held_at);
        self
    }
}

/// Read-only view of a ticket as supplied by the persistence layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    pub ticket_number: TicketNumber,
    pub kind: TicketKind,
    pub window: TicketWindow,
    pub work_to_begin_at: Option<Timestamp>,
}

impl TicketSnapshot {
    pub fn normal(ticket_number: impl Into<String>, filed_at: Timestamp) -> Self {
        Self {
            ticket_number: TicketNumber(ticket_number.into()),
            kind: TicketKind::Normal,
            window: TicketWindow::filed(filed_at),
            work_to_begin_at: None,
        }
    }

    pub fn meet(ticket_number: impl Into<String>, filed_at: Timestamp) -> Self {
        Self { kind: TicketKind::Meet, ..Self::normal(ticket_number, filed_at) }
    }

    pub fn with_meet_held_at(mut self, meet_held_at: Timestamp) -> Self {
        self.window = self.window.with_meet(meet_held_at);
        self
    }

    pub fn with_work_to_begin_at(mut self, work_to_begin_at: Timestamp) -> Self {
        self.work_to_begin_at = Some(work_to_begin_at);
        self
    }

    /// Records that the scheduled meet took place. The meet time is set once.
    pub fn record_meet(&mut self, meet_held_at: Timestamp) -> Result<(), DomainError> {
        if let Some(existing) = self.window.meet_held_at {
            return Err(DomainError::InvalidTicketState {
                ticket: self.ticket_number.0.clone(),
                reason: format!("meet already recorded at {existing}"),
            });
        }
        self.kind = TicketKind::Meet;
        self.window.meet_held_at = Some(meet_held_at);
        Ok(())
    }

    pub fn require_meet_held_at(&self) -> Result<Timestamp, DomainError> {
        self.window.meet_held_at.ok_or_else(|| DomainError::InvalidTicketState {
            ticket: self.ticket_number.0.clone(),
            reason: "excavation start cannot be determined until a meet is logged".to_string(),
        })
    }
}

/// Legal timestamps derived from a [`TicketWindow`]; never a source of truth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedTimestamps {
    pub locate_ready_at: Timestamp,
    pub excavation_earliest_at: Option<Timestamp>,
    pub expires_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{TicketKind, TicketSnapshot};
    use crate::domain::Timestamp;
    use crate::errors::DomainError;

    fn at(day: u32, hour: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn meet_is_recorded_once() {
        let mut ticket = TicketSnapshot::normal("A251530001", at(2, 10));
        ticket.record_meet(at(4, 9)).expect("first meet is accepted");

        assert_eq!(ticket.kind, TicketKind::Meet);
        assert_eq!(ticket.window.meet_held_at, Some(at(4, 9)));

        let error = ticket.record_meet(at(5, 9)).expect_err("second meet is rejected");
        assert!(matches!(error, DomainError::InvalidTicketState { .. }));
        assert_eq!(ticket.window.meet_held_at, Some(at(4, 9)));
    }

    #[test]
    fn missing_meet_is_surfaced_not_defaulted() {
        let ticket = TicketSnapshot::meet("A251530002", at(2, 10));
        let error = ticket.require_meet_held_at().expect_err("no meet logged yet");

        assert!(error.to_string().contains("A251530002"));
        assert!(error.to_string().contains("until a meet is logged"));
    }
}
