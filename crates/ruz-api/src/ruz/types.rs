//! RUZ API response types.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone as _};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use super::campus::campus_timezone;
use super::error::{Result, RuzError};
use super::params::parse_api_date;

// --- Field decoders ---

/// Deserializes a `YYYY.MM.DD` date.
fn de_api_date<'de, D>(d: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    parse_api_date(&s).map_err(serde::de::Error::custom)
}

/// Deserializes an `HH:MM` time of day.
fn de_lesson_time<'de, D>(d: D) -> std::result::Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
}

/// Deserializes a field that must be present but may be `null`.
///
/// A plain `Option` field would silently accept a missing key.
fn de_nullable<'de, D, T>(d: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d)
}

/// Deserializes an identifier sent either as a number or a numeric string.
fn de_id<'de, D>(d: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(d)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Parses a RUZ timestamp such as `2021-02-19T10:37:16Z03:00` or `2021-02-19T10:37:16Z`.
///
/// RUZ writes `Z` where ISO 8601 expects the offset sign.
fn parse_ruz_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let iso = match s.split_once('Z') {
        Some((head, "")) => format!("{head}+00:00"),
        Some((head, offset)) => format!("{head}+{offset}"),
        None => String::from(s),
    };
    match DateTime::parse_from_rfc3339(&iso) {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::debug!(timestamp = s, error = %e, "Unparseable RUZ timestamp");
            None
        }
    }
}

// --- Schedule ---

/// A single lesson from the `schedule` endpoint.
///
/// Wire names are mapped explicitly; unknown or missing keys fail decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Lesson {
    /// Room label, `"<campus> <building>/<room>"`.
    pub auditorium: String,
    /// Room capacity.
    pub auditorium_amount: i32,
    /// Room ID.
    pub auditorium_oid: i64,
    /// Schedule author.
    #[serde(deserialize_with = "de_nullable")]
    pub author: Option<String>,
    /// Start time (local to the campus).
    #[serde(deserialize_with = "de_lesson_time")]
    pub begin_lesson: NaiveTime,
    /// Building address.
    pub building: String,
    /// Creation timestamp (raw RUZ format).
    #[serde(rename = "createddate", deserialize_with = "de_nullable")]
    pub created_date: Option<String>,
    /// Calendar date.
    #[serde(deserialize_with = "de_api_date")]
    pub date: NaiveDate,
    /// Date of the parent schedule nest.
    #[serde(deserialize_with = "de_nullable")]
    pub date_of_nest: Option<String>,
    /// ISO weekday number (1 = Monday).
    pub day_of_week: u8,
    /// Weekday name.
    pub day_of_week_string: String,
    /// Free-form details.
    #[serde(deserialize_with = "de_nullable")]
    pub detail_info: Option<String>,
    /// Subject name.
    pub discipline: String,
    /// Subject ID.
    pub discipline_oid: i64,
    /// Subject name in the study plan.
    #[serde(rename = "disciplineinplan", deserialize_with = "de_nullable")]
    pub discipline_in_plan: Option<String>,
    /// Subject load type.
    #[serde(rename = "disciplinetypeload")]
    pub discipline_type_load: i64,
    /// End time (local to the campus).
    #[serde(deserialize_with = "de_lesson_time")]
    pub end_lesson: NaiveTime,
    /// Group (shape varies between string and `null`).
    pub group: JsonValue,
    /// Group ID.
    pub group_oid: i64,
    /// Hidden-in-capacity flag.
    #[serde(rename = "hideincapacity")]
    pub hide_in_capacity: i64,
    /// Slot is banned or cancelled.
    pub is_ban: bool,
    /// Lesson type (lecture, seminar, ...).
    pub kind_of_work: String,
    /// Lecturer name.
    pub lecturer: String,
    /// Lecturer ID.
    pub lecturer_oid: i64,
    /// Lecturer UID.
    #[serde(rename = "lecturerUID", deserialize_with = "de_nullable")]
    pub lecturer_uid: Option<String>,
    /// Last lesson number in the day grid.
    pub lesson_number_end: i32,
    /// First lesson number in the day grid.
    pub lesson_number_start: i32,
    /// Modification timestamp (raw RUZ format).
    #[serde(rename = "modifieddate", deserialize_with = "de_nullable")]
    pub modified_date: Option<String>,
    /// Parent schedule name.
    #[serde(rename = "parentschedule", deserialize_with = "de_nullable")]
    pub parent_schedule: Option<String>,
    /// Stream name.
    #[serde(deserialize_with = "de_nullable")]
    pub stream: Option<String>,
    /// Stream ID.
    pub stream_oid: i64,
    /// Subgroup (shape varies between string and `null`).
    pub sub_group: JsonValue,
    /// Subgroup ID.
    pub sub_group_oid: i64,
}

impl Lesson {
    /// Campus code: first space-delimited token of the room label.
    #[must_use]
    pub fn campus(&self) -> &str {
        self.auditorium
            .split_once(' ')
            .map_or(self.auditorium.as_str(), |(campus, _)| campus)
    }

    /// Room index: last slash-delimited token of the room label.
    #[must_use]
    pub fn auditorium_index(&self) -> &str {
        self.auditorium
            .rsplit_once('/')
            .map_or(self.auditorium.as_str(), |(_, index)| index)
    }

    /// Timezone of the lesson's campus.
    ///
    /// # Errors
    ///
    /// Returns [`RuzError::UnknownCampus`] if the campus code is not known.
    pub fn timezone(&self) -> Result<Tz> {
        campus_timezone(self.campus())
    }

    /// Lesson start in the campus timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the campus is unknown or the local time does not exist.
    pub fn starts_at(&self) -> Result<DateTime<Tz>> {
        self.localize(self.begin_lesson)
    }

    /// Lesson end in the campus timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the campus is unknown or the local time does not exist.
    pub fn ends_at(&self) -> Result<DateTime<Tz>> {
        self.localize(self.end_lesson)
    }

    /// Parsed modification timestamp, `None` if absent or unparseable.
    #[must_use]
    pub fn modified_at(&self) -> Option<DateTime<FixedOffset>> {
        self.modified_date.as_deref().and_then(parse_ruz_timestamp)
    }

    /// Parsed creation timestamp, `None` if absent or unparseable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.created_date.as_deref().and_then(parse_ruz_timestamp)
    }

    /// Combines the lesson date with `time` in the campus timezone.
    /// Ambiguous local times resolve to the earlier instant.
    fn localize(&self, time: NaiveTime) -> Result<DateTime<Tz>> {
        let tz = self.timezone()?;
        let local = NaiveDateTime::new(self.date, time);
        tz.from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| RuzError::NonexistentLocalTime {
                campus: String::from(self.campus()),
                datetime: local,
            })
    }
}

// --- Student info ---

/// Response from the `studentinfo` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentInfo {
    /// RUZ person ID used by `schedule`.
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    /// University number.
    #[serde(deserialize_with = "de_nullable")]
    pub uns: Option<String>,
    /// Email address.
    pub email: String,
    /// Full name.
    pub fio: String,
    /// Additional info (faculty, group).
    #[serde(deserialize_with = "de_nullable")]
    pub info: Option<String>,
    /// Any other keys returned by the API.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}
