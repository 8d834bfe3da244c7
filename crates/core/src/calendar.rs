//! Business-day calendar used by every statutory waiting period.
//!
//! Holiday data is injected through [`HolidayCalendar`]; nothing in this
//! module hardcodes a jurisdiction's holidays. A [`HolidaySet`] is usually
//! built from configuration (inline ISO dates and/or a holiday file).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest run of calendar days a business-day walk consults holidays for.
pub const MAX_HOLIDAY_SCAN_DAYS: u64 = 366;

/// Read-only source of non-business dates for one jurisdiction.
///
/// A calendar that marks a full year of consecutive weekdays as holidays is
/// treated as broken: walks past [`MAX_HOLIDAY_SCAN_DAYS`] fall back to
/// counting weekdays only.
pub trait HolidayCalendar: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

impl<T> HolidayCalendar for &T
where
    T: HolidayCalendar + ?Sized,
{
    fn is_holiday(&self, date: NaiveDate) -> bool {
        (**self).is_holiday(date)
    }
}

impl<T> HolidayCalendar for Arc<T>
where
    T: HolidayCalendar + ?Sized,
{
    fn is_holiday(&self, date: NaiveDate) -> bool {
        (**self).is_holiday(date)
    }
}

/// Calendar with no holidays; only weekends are excluded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("could not read holiday file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse holiday file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid holiday date `{value}` (expected YYYY-MM-DD)")]
    InvalidDate { value: String },
}

/// Ordered set of holiday dates, optionally named.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeMap<NaiveDate, Option<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HolidayFile {
    #[serde(default)]
    holiday: Vec<HolidayEntry>,
}

#[derive(Debug, Deserialize)]
struct HolidayEntry {
    date: String,
    name: Option<String>,
}

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dates<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self { dates: dates.into_iter().map(|date| (date, None)).collect() }
    }

    /// Parses a list of `YYYY-MM-DD` strings. Blank entries are skipped.
    pub fn parse_iso_dates<I, S>(values: I) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for value in values {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            set.insert(parse_iso_date(value)?, None);
        }
        Ok(set)
    }

    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, CalendarError> {
        let file = toml::from_str::<HolidayFile>(raw)
            .map_err(|source| CalendarError::ParseFile { path: path.to_path_buf(), source })?;

        let mut set = Self::new();
        for entry in file.holiday {
            set.insert(parse_iso_date(entry.date.trim())?, entry.name);
        }
        Ok(set)
    }

    pub fn load_file(path: &Path) -> Result<Self, CalendarError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CalendarError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw, path)
    }

    /// Adds a date. A name already on record is kept when `name` is `None`.
    pub fn insert(&mut self, date: NaiveDate, name: Option<String>) {
        let slot = self.dates.entry(date).or_insert(None);
        if name.is_some() {
            *slot = name;
        }
    }

    pub fn merge(&mut self, other: HolidaySet) {
        for (date, name) in other.dates {
            self.insert(date, name);
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains_key(&date)
    }

    pub fn name_of(&self, date: NaiveDate) -> Option<&str> {
        self.dates.get(&date).and_then(|name| name.as_deref())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Holiday> + '_ {
        self.dates.iter().map(|(date, name)| Holiday { date: *date, name: name.clone() })
    }

    pub fn in_year(&self, year: i32) -> Vec<Holiday> {
        self.iter().filter(|holiday| holiday.date.year() == year).collect()
    }

    pub fn covers_year(&self, year: i32) -> bool {
        self.dates.keys().any(|date| date.year() == year)
    }
}

impl HolidayCalendar for HolidaySet {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.contains(date)
    }
}

pub fn parse_iso_date(value: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidDate { value: value.to_string() })
}

/// Weekend and holiday aware view over an injected [`HolidayCalendar`].
///
/// Lookups take a [`NaiveDate`], so callers strip time-of-day before asking.
#[derive(Clone, Copy)]
pub struct BusinessCalendar<'a> {
    holidays: &'a dyn HolidayCalendar,
}

impl<'a> BusinessCalendar<'a> {
    pub fn new(holidays: &'a dyn HolidayCalendar) -> Self {
        Self { holidays }
    }

    pub fn weekends_only() -> BusinessCalendar<'static> {
        BusinessCalendar { holidays: &NoHolidays }
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.is_holiday(date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.is_weekend(date) && !self.is_holiday(date)
    }

    /// Walks forward from the day after `date` and returns the `count`-th
    /// business day reached. `count == 0` returns `date` unchanged.
    pub fn nth_business_day_after(&self, date: NaiveDate, count: u32) -> NaiveDate {
        let mut day = date;
        let mut counted = 0;
        let mut scanned = 0;
        let mut honour_holidays = true;
        while counted < count {
            day = day + Days::new(1);
            scanned += 1;
            if honour_holidays && scanned > MAX_HOLIDAY_SCAN_DAYS {
                warn!(
                    event_name = "calendar.scan.capped",
                    from = %date,
                    count,
                    "holiday calendar left no business day within a year; counting weekdays only"
                );
                honour_holidays = false;
            }

            let counts = if honour_holidays {
                self.is_business_day(day)
            } else {
                !self.is_weekend(day)
            };
            if counts {
                counted += 1;
            }
        }
        day
    }
}

impl std::fmt::Debug for BusinessCalendar<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessCalendar").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::NaiveDate;

    use super::{
        BusinessCalendar, CalendarError, HolidayCalendar, HolidaySet, MAX_HOLIDAY_SCAN_DAYS,
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn weekends_are_never_business_days() {
        let calendar = BusinessCalendar::weekends_only();

        assert!(!calendar.is_business_day(date(2025, 6, 7)));
        assert!(!calendar.is_business_day(date(2025, 6, 8)));
        assert!(calendar.is_business_day(date(2025, 6, 9)));
    }

    #[test]
    fn configured_holiday_is_excluded() {
        let holidays = HolidaySet::from_dates([date(2025, 7, 4)]);
        let calendar = BusinessCalendar::new(&holidays);

        assert!(calendar.is_holiday(date(2025, 7, 4)));
        assert!(!calendar.is_business_day(date(2025, 7, 4)));
        assert!(calendar.is_business_day(date(2025, 7, 3)));
    }

    #[test]
    fn empty_holiday_set_degrades_to_weekends_only() {
        let holidays = HolidaySet::new();
        let calendar = BusinessCalendar::new(&holidays);

        assert!(calendar.is_business_day(date(2025, 7, 4)));
        assert!(!calendar.is_business_day(date(2025, 7, 5)));
    }

    #[test]
    fn nth_business_day_skips_weekend_and_holiday() {
        let holidays = HolidaySet::from_dates([date(2025, 7, 4)]);
        let calendar = BusinessCalendar::new(&holidays);

        assert_eq!(calendar.nth_business_day_after(date(2025, 7, 3), 1), date(2025, 7, 7));
        assert_eq!(calendar.nth_business_day_after(date(2025, 7, 3), 2), date(2025, 7, 8));
        assert_eq!(calendar.nth_business_day_after(date(2025, 7, 3), 0), date(2025, 7, 3));
    }

    struct EveryDayIsAHoliday;

    impl HolidayCalendar for EveryDayIsAHoliday {
        fn is_holiday(&self, _date: NaiveDate) -> bool {
            true
        }
    }

    #[test]
    fn holiday_walk_is_capped_for_calendar_without_business_days() {
        let calendar = BusinessCalendar::new(&EveryDayIsAHoliday);
        let start = date(2025, 6, 2);

        let day = calendar.nth_business_day_after(start, 2);

        assert!(!calendar.is_weekend(day));
        let scanned = (day - start).num_days();
        assert!(scanned > MAX_HOLIDAY_SCAN_DAYS as i64);
        assert!(scanned <= MAX_HOLIDAY_SCAN_DAYS as i64 + 7);
    }

    #[test]
    fn parses_iso_dates_and_skips_blanks() {
        let set = HolidaySet::parse_iso_dates(["2025-12-25", " ", "2025-12-24 "])
            .expect("valid dates");

        assert_eq!(set.len(), 2);
        assert!(set.is_holiday(date(2025, 12, 24)));
    }

    #[test]
    fn rejects_malformed_iso_date() {
        let error = HolidaySet::parse_iso_dates(["2025-13-01"]).expect_err("month 13 is invalid");
        assert!(matches!(error, CalendarError::InvalidDate { ref value } if value == "2025-13-01"));
    }

    #[test]
    fn parses_named_holidays_from_toml() {
        let raw = r#"
[[holiday]]
date = "2025-11-27"
name = "Thanksgiving"

[[holiday]]
date = "2025-11-28"
"#;
        let set = HolidaySet::from_toml_str(raw, Path::new("holidays.toml")).expect("parse");

        assert_eq!(set.name_of(date(2025, 11, 27)), Some("Thanksgiving"));
        assert_eq!(set.name_of(date(2025, 11, 28)), None);
        assert!(set.covers_year(2025));
        assert!(!set.covers_year(2026));
    }

    #[test]
    fn merge_keeps_existing_names() {
        let mut named = HolidaySet::new();
        named.insert(date(2026, 1, 1), Some("New Year's Day".to_string()));
        named.merge(HolidaySet::from_dates([date(2026, 1, 1), date(2026, 1, 19)]));

        assert_eq!(named.len(), 2);
        assert_eq!(named.name_of(date(2026, 1, 1)), Some("New Year's Day"));
        assert_eq!(named.in_year(2026).len(), 2);
    }
}
