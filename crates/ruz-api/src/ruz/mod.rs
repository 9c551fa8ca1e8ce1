//! RUZ API client module.
//!
//! Handles HTTP requests to the RUZ `search`, `studentinfo` and `schedule`
//! endpoints and maps the JSON responses to lesson records.

mod api;
mod campus;
mod client;
mod email;
mod error;
mod params;
mod types;
mod util;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalRuzApi, RuzApi};
pub use campus::campus_timezone;
#[allow(clippy::module_name_repetitions)]
pub use client::{RUZ_BASE_URL, RuzClient, RuzClientBuilder, VERIFY_SSL_ENV};
pub use email::{is_institutional_email, is_student_email, person_type_from_email};
#[allow(clippy::module_name_repetitions)]
pub use error::{Result, RuzError};
pub use params::{
    Language, PersonType, ScheduleEnd, ScheduleParams, SearchType, format_api_date,
    parse_api_date,
};
pub use types::{Lesson, StudentInfo};
pub use util::student_schedule;
