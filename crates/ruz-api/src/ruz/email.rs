//! HSE email classification.
//!
//! Students get mailboxes on `edu.hse.ru`, staff on `hse.ru`.

use std::sync::LazyLock;

use regex::Regex;

use super::error::{Result, RuzError};
use super::params::PersonType;

/// Regex for institutional addresses. Group 1 captures the student subdomain.
#[allow(clippy::expect_used)]
static HSE_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._-]{3,}@(edu\.)?hse\.ru$").expect("failed to compile email regex")
});

/// Returns `true` if the address belongs to the HSE mail domain.
///
/// Matching is case-insensitive.
#[must_use]
pub fn is_institutional_email(email: &str) -> bool {
    HSE_EMAIL_RE.is_match(&email.to_lowercase())
}

/// Returns `true` if the address is a student mailbox (`edu.hse.ru`).
///
/// # Errors
///
/// Returns [`RuzError::InvalidArgument`] if the address is not an HSE email at all.
pub fn is_student_email(email: &str) -> Result<bool> {
    let lowered = email.to_lowercase();
    let caps = HSE_EMAIL_RE
        .captures(&lowered)
        .ok_or_else(|| RuzError::InvalidArgument(format!("not an HSE email: {email:?}")))?;
    Ok(caps.get(1).is_some())
}

/// Derives the schedule person type from an HSE email.
///
/// # Errors
///
/// Returns [`RuzError::InvalidArgument`] if the address is not an HSE email.
pub fn person_type_from_email(email: &str) -> Result<PersonType> {
    if is_student_email(email)? {
        Ok(PersonType::Student)
    } else {
        Ok(PersonType::Lecturer)
    }
}
