//! RUZ API composite operations.

use tracing::instrument;

use super::api::LocalRuzApi;
use super::error::Result;
use super::params::{PersonType, ScheduleParams};
use super::types::Lesson;

/// Fetches a student's schedule by email.
///
/// Resolves the RUZ person ID with `student_info` first; the schedule
/// request is only sent once that succeeds.
///
/// # Errors
///
/// Returns the `student_info` error (e.g. unknown email) without issuing
/// the schedule request, or any error of the `schedule` call.
#[instrument(skip_all)]
pub async fn student_schedule(
    api: &(impl LocalRuzApi + Sync),
    email: &str,
    params: &ScheduleParams,
) -> Result<Vec<Lesson>> {
    let info = api.student_info(email).await?;
    tracing::debug!(id = info.id, "Resolved student");
    api.schedule(PersonType::Student, info.id, params).await
}
