//! Utility readiness: folds the current response set into a dig verdict.
//!
//! The verdict is recomputed from responses on every call and never stored.

use serde::{Deserialize, Serialize};

use crate::domain::response::{ResponseStatus, UtilityResponse};
use crate::domain::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessVerdict {
    Pending,
    Ready,
    Conflict,
}

impl ReadinessVerdict {
    pub fn banner(self) -> &'static str {
        match self {
            Self::Ready => "READY TO DIG",
            Self::Conflict => "DO NOT DIG - CONFLICT REPORTED",
            Self::Pending => "PENDING UTILITY RESPONSES",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            Self::Ready => {
                "All notified utilities have responded with Clear or Marked status. Proceed with caution."
            }
            Self::Conflict => {
                "One or more utilities have reported a conflict. Contact them immediately."
            }
            Self::Pending => {
                "Waiting for all utilities to respond. Do not excavate until all clear."
            }
        }
    }

    pub fn allows_excavation(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Folds response statuses into a verdict. Conflict wins over everything, an
/// empty set is pending, and the result does not depend on order.
pub fn aggregate_statuses<I>(statuses: I) -> ReadinessVerdict
where
    I: IntoIterator<Item = ResponseStatus>,
{
    let mut seen_any = false;
    let mut all_clear = true;

    for status in statuses {
        seen_any = true;
        if status == ResponseStatus::Conflict {
            return ReadinessVerdict::Conflict;
        }
        all_clear &= status.is_clearance();
    }

    if seen_any && all_clear {
        ReadinessVerdict::Ready
    } else {
        ReadinessVerdict::Pending
    }
}

pub fn aggregate(responses: &[UtilityResponse]) -> ReadinessVerdict {
    aggregate_statuses(responses.iter().map(|response| response.status))
}

/// Verdict plus the utilities holding it up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub verdict: ReadinessVerdict,
    pub banner: String,
    pub total_responses: usize,
    pub conflicting_utilities: Vec<String>,
    pub outstanding_utilities: Vec<String>,
    /// Most recent dated response, if any response carries a date.
    pub last_response_at: Option<Timestamp>,
}

impl ReadinessReport {
    pub fn from_responses(responses: &[UtilityResponse]) -> Self {
        let verdict = aggregate(responses);
        let names_with = |status: ResponseStatus| {
            let mut names: Vec<String> = responses
                .iter()
                .filter(|response| response.status == status)
                .map(|response| response.utility_name.clone())
                .collect();
            names.sort();
            names.dedup();
            names
        };

        Self {
            verdict,
            banner: verdict.banner().to_string(),
            total_responses: responses.len(),
            conflicting_utilities: names_with(ResponseStatus::Conflict),
            outstanding_utilities: names_with(ResponseStatus::NotResponded),
            last_response_at: responses
                .iter()
                .filter_map(|response| response.response_date)
                .max(),
        }
    }
}
