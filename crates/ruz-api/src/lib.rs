//! API client library for the HSE RUZ timetable service.
//!
//! Resolves people by email, fetches their lesson schedule and searches
//! students, lecturers, groups and auditoriums.

/// RUZ API client.
pub mod ruz;
