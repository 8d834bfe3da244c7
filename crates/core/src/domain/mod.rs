pub mod response;
pub mod ticket;

/// Wall-clock time in the jurisdiction's canonical time zone.
pub type Timestamp = chrono::NaiveDateTime;
