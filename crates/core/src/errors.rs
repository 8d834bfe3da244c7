use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid ticket state for `{ticket}`: {reason}")]
    InvalidTicketState { ticket: String, reason: String },
    #[error("unknown utility response status `{0}`")]
    UnknownResponseStatus(String),
    #[error("invalid timestamp `{0}` (expected YYYY-MM-DDTHH:MM[:SS])")]
    InvalidTimestamp(String),
    #[error("malformed utility response `{0}` (expected Utility=Status)")]
    MalformedResponse(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("holiday calendar failure: {0}")]
    Calendar(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn detail(&self) -> &str {
        match self {
            Self::BadRequest { message, .. } | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The ticket could not be evaluated. Check the ticket fields and try again."
            }
            Self::Internal { .. } => "The compliance calendar is misconfigured.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<crate::calendar::CalendarError> for ApplicationError {
    fn from(value: crate::calendar::CalendarError) -> Self {
        Self::Calendar(value.to_string())
    }
}

impl From<crate::config::ConfigError> for ApplicationError {
    fn from(value: crate::config::ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Calendar(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
