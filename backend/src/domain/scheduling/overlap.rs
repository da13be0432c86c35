//! Double-booking guard.
//!
//! Intervals are half-open `[start, effective-end)`: two appointments that
//! merely touch at an endpoint do not conflict. Only schedulable statuses
//! participate; completed and cancelled appointments never block a slot.
//!
//! The scan is O(active appointments for the tenant) per check. At clinic
//! scale that set is small; the store may additionally enforce an exclusion
//! constraint to close the read-then-write race between concurrent creates.

use chrono::{DateTime, Utc};

use super::time_range::resolve_end;
use crate::domain::Appointment;

/// Raised when a candidate interval collides with an active appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("appointment time overlaps with an existing appointment")]
pub struct OverlapConflict;

/// Classic half-open interval overlap test.
pub fn intervals_conflict(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Check a candidate interval against the tenant's active appointments.
///
/// `siblings` must already be restricted to the owner's schedulable
/// appointments, excluding the record being updated. Each sibling's effective
/// end is resolved with the same default-duration policy as the candidate.
/// A candidate without resolvable bounds cannot overlap anything.
pub fn assert_no_overlap(
    candidate_start: Option<DateTime<Utc>>,
    candidate_end: Option<DateTime<Utc>>,
    siblings: &[Appointment],
    default_duration_minutes: i64,
) -> Result<(), OverlapConflict> {
    let effective_end = resolve_end(candidate_start, candidate_end, default_duration_minutes);
    let (Some(start), Some(end)) = (candidate_start, effective_end) else {
        return Ok(());
    };

    for existing in siblings {
        let existing_end = resolve_end(
            Some(existing.start_at),
            existing.end_at,
            default_duration_minutes,
        );
        if let Some(existing_end_at) = existing_end
            && intervals_conflict(start, end, existing.start_at, existing_end_at)
        {
            return Err(OverlapConflict);
        }
    }
    Ok(())
}
