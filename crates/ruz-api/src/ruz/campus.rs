//! Campus code to timezone table.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono_tz::Tz;

use super::error::{Result, RuzError};

/// Timezones of the HSE campuses, keyed by the code that prefixes room labels.
static CAMPUS_TIMEZONES: LazyLock<HashMap<&'static str, Tz>> = LazyLock::new(|| {
    HashMap::from([
        ("М", chrono_tz::Europe::Moscow),
        ("СПБ", chrono_tz::Europe::Moscow),
        ("НН", chrono_tz::Europe::Moscow),
        ("П", chrono_tz::Asia::Yekaterinburg),
    ])
});

/// Looks up the timezone of a campus.
///
/// # Errors
///
/// Returns [`RuzError::UnknownCampus`] if the code is not in the table.
pub fn campus_timezone(campus: &str) -> Result<Tz> {
    CAMPUS_TIMEZONES
        .get(campus)
        .copied()
        .ok_or_else(|| RuzError::UnknownCampus(String::from(campus)))
}
