//! RUZ API request parameter types.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, TimeDelta};

use super::error::{Result, RuzError};

/// Wire format of dates in query parameters and lesson records.
const API_DATE_FORMAT: &str = "%Y.%m.%d";

/// Default schedule window length in days.
const DEFAULT_SCHEDULE_DAYS: i64 = 7;

/// Formats a date as the RUZ `YYYY.MM.DD` string.
///
/// Example: `2021-01-04` -> `"2021.01.04"`
#[must_use]
pub fn format_api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

/// Parses a RUZ `YYYY.MM.DD` date string.
///
/// # Errors
///
/// Returns [`RuzError::InvalidArgument`] if the string is not a valid date.
pub fn parse_api_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, API_DATE_FORMAT)
        .map_err(|e| RuzError::InvalidArgument(format!("invalid RUZ date {s:?}: {e}")))
}

/// Person type accepted by the `schedule` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonType {
    /// Student schedule.
    Student,
    /// Lecturer schedule.
    Lecturer,
}

impl PersonType {
    /// Path segment used in `schedule/{person_type}/{id}`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Lecturer => "lecturer",
        }
    }
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonType {
    type Err = RuzError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(Self::Student),
            "lecturer" => Ok(Self::Lecturer),
            other => Err(RuzError::InvalidArgument(format!(
                "person type must be one of (student, lecturer), got {other:?}"
            ))),
        }
    }
}

/// Entity kind for the `search` endpoint `type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchType {
    /// Students.
    #[default]
    Student,
    /// Lecturers.
    Lecturer,
    /// Study groups.
    Group,
    /// Auditoriums.
    Auditorium,
}

impl SearchType {
    /// Value sent as the `type` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Lecturer => "lecturer",
            Self::Group => "group",
            Self::Auditorium => "auditorium",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = RuzError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(Self::Student),
            "lecturer" => Ok(Self::Lecturer),
            "group" => Ok(Self::Group),
            "auditorium" => Ok(Self::Auditorium),
            other => Err(RuzError::InvalidArgument(format!(
                "search type must be one of (student, lecturer, group, auditorium), got {other:?}"
            ))),
        }
    }
}

impl From<PersonType> for SearchType {
    fn from(value: PersonType) -> Self {
        match value {
            PersonType::Student => Self::Student,
            PersonType::Lecturer => Self::Lecturer,
        }
    }
}

/// Response language (`lng` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// Russian (`lng=1`).
    #[default]
    Russian,
    /// English (`lng=2`).
    English,
}

impl Language {
    /// Numeric code sent as `lng`.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Russian => 1,
            Self::English => 2,
        }
    }
}

impl FromStr for Language {
    type Err = RuzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "ru" | "russian" => Ok(Self::Russian),
            "2" | "en" | "english" => Ok(Self::English),
            other => Err(RuzError::InvalidArgument(format!(
                "language must be ru (1) or en (2), got {other:?}"
            ))),
        }
    }
}

/// End of a schedule window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEnd {
    /// Explicit last date.
    Date(NaiveDate),
    /// Number of days after the start date (not after today).
    Days(i64),
}

/// Request parameters for `schedule`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleParams {
    /// First date (`None` = today).
    pub from: Option<NaiveDate>,
    /// Last date or offset (`None` = start + 7 days).
    pub to: Option<ScheduleEnd>,
    /// Response language.
    pub language: Language,
}

impl ScheduleParams {
    /// Creates params for the default window (today, 7 days, Russian).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first date.
    #[must_use]
    pub const fn start(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    /// Sets an explicit last date.
    #[must_use]
    pub const fn until(mut self, date: NaiveDate) -> Self {
        self.to = Some(ScheduleEnd::Date(date));
        self
    }

    /// Sets the last date as an offset in days from the first date.
    #[must_use]
    pub const fn days(mut self, days: i64) -> Self {
        self.to = Some(ScheduleEnd::Days(days));
        self
    }

    /// Sets the response language.
    #[must_use]
    pub const fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Resolves the `(start, finish)` dates, using `today` when `from` is unset.
    ///
    /// # Errors
    ///
    /// Returns [`RuzError::InvalidArgument`] if the day offset overflows the calendar.
    pub fn resolve_with_today(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let start = self.from.unwrap_or(today);
        let finish = match self.to {
            Some(ScheduleEnd::Date(date)) => date,
            Some(ScheduleEnd::Days(days)) => offset_date(start, days)?,
            None => offset_date(start, DEFAULT_SCHEDULE_DAYS)?,
        };
        Ok((start, finish))
    }

    /// Resolves the `(start, finish)` dates against the local date.
    ///
    /// # Errors
    ///
    /// Returns [`RuzError::InvalidArgument`] if the day offset overflows the calendar.
    pub fn resolve(&self) -> Result<(NaiveDate, NaiveDate)> {
        self.resolve_with_today(Local::now().date_naive())
    }
}

/// Adds a signed number of days to a date.
fn offset_date(start: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or_else(|| {
            RuzError::InvalidArgument(format!("{start} + {days} days is out of range"))
        })
}
