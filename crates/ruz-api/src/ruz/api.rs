//! `RuzApi` trait definition.
#![allow(clippy::future_not_send)]

use serde_json::Value as JsonValue;

use super::error::Result;
use super::params::{PersonType, ScheduleParams, SearchType};
use super::types::{Lesson, StudentInfo};

/// RUZ API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(RuzApi: Send)]
pub trait LocalRuzApi {
    /// Searches people, groups or auditoriums by free-text query.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the body is not JSON,
    /// or the API reports an error.
    async fn search(&self, query: &str, search_type: SearchType) -> Result<Vec<JsonValue>>;

    /// Resolves a student by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails,
    /// or the API reports an error (e.g. unknown email).
    async fn student_info(&self, email: &str) -> Result<StudentInfo>;

    /// Fetches the lessons of a student or lecturer for a date window.
    ///
    /// # Errors
    ///
    /// Returns an error if the date window cannot be resolved, the HTTP
    /// request or JSON decoding fails, or the API reports an error.
    async fn schedule(
        &self,
        person_type: PersonType,
        person_id: u64,
        params: &ScheduleParams,
    ) -> Result<Vec<Lesson>>;
}
