use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Timestamp;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Marked,
    Clear,
    Conflict,
    NotResponded,
}

impl ResponseStatus {
    pub const ALL: [ResponseStatus; 4] =
        [Self::Marked, Self::Clear, Self::Conflict, Self::NotResponded];

    pub fn label(self) -> &'static str {
        match self {
            Self::Marked => "Marked",
            Self::Clear => "Clear",
            Self::Conflict => "Conflict",
            Self::NotResponded => "Not Responded",
        }
    }

    /// Marked or Clear; the utility has no objection to digging.
    pub fn is_clearance(self) -> bool {
        matches!(self, Self::Marked | Self::Clear)
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResponseStatus {
    type Err = DomainError;

    // Case and separators are ignored. "No Conflict" is an alias of Clear.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "marked" => Ok(Self::Marked),
            "clear" | "noconflict" => Ok(Self::Clear),
            "conflict" => Ok(Self::Conflict),
            "notresponded" => Ok(Self::NotResponded),
            _ => Err(DomainError::UnknownResponseStatus(value.trim().to_string())),
        }
    }
}

/// One utility's answer to a ticket. Corrections are new records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityResponse {
    pub utility_name: String,
    pub status: ResponseStatus,
    pub response_date: Option<Timestamp>,
}

impl UtilityResponse {
    pub fn new(utility_name: impl Into<String>, status: ResponseStatus) -> Self {
        Self { utility_name: utility_name.into(), status, response_date: None }
    }

    pub fn responded_at(mut self, response_date: Timestamp) -> Self {
        self.response_date = Some(response_date);
        self
    }
}
