//! Time-range normalization for appointments.
//!
//! Pure functions: no I/O, no side effects. The effective end of an
//! appointment is its explicit end, or its start plus the clinic's default
//! visit duration when no end was recorded.

use chrono::{DateTime, Duration, Utc};

/// Raised when an appointment's end does not fall strictly after its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("appointment end time must be after start time")]
pub struct InvalidTimeRange;

/// Resolve the effective end of an interval.
///
/// Returns `end` when present, otherwise `start + default_duration_minutes`,
/// or `None` when no start exists to anchor the default.
pub fn resolve_end(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    default_duration_minutes: i64,
) -> Option<DateTime<Utc>> {
    match (start, end) {
        (_, Some(end_at)) => Some(end_at),
        (Some(start_at), None) => Some(start_at + Duration::minutes(default_duration_minutes)),
        (None, None) => None,
    }
}

/// Validate that `end`, when present alongside `start`, is strictly after it.
///
/// A missing bound makes the pair trivially valid; lazy end resolution cannot
/// produce an inverted interval from a bare start.
pub fn validate_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), InvalidTimeRange> {
    if let (Some(start_at), Some(end_at)) = (start, end)
        && end_at <= start_at
    {
        return Err(InvalidTimeRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, hour, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn explicit_end_wins_over_default() {
        let resolved = resolve_end(Some(at(9, 0)), Some(at(10, 0)), 30);
        assert_eq!(resolved, Some(at(10, 0)));
    }

    #[rstest]
    fn missing_end_falls_back_to_default_duration() {
        let resolved = resolve_end(Some(at(9, 0)), None, 30);
        assert_eq!(resolved, Some(at(9, 30)));
    }

    #[rstest]
    fn missing_start_resolves_to_nothing() {
        assert_eq!(resolve_end(None, None, 30), None);
    }

    #[rstest]
    #[case(at(9, 0), at(9, 0))]
    #[case(at(9, 0), at(8, 59))]
    fn end_at_or_before_start_is_rejected(
        #[case] start: DateTime<Utc>,
        #[case] end: DateTime<Utc>,
    ) {
        assert_eq!(
            validate_range(Some(start), Some(end)),
            Err(InvalidTimeRange)
        );
    }

    #[rstest]
    fn end_after_start_passes() {
        assert_eq!(validate_range(Some(at(9, 0)), Some(at(9, 1))), Ok(()));
    }

    #[rstest]
    fn absent_bounds_are_trivially_valid() {
        assert_eq!(validate_range(Some(at(9, 0)), None), Ok(()));
        assert_eq!(validate_range(None, Some(at(9, 0))), Ok(()));
        assert_eq!(validate_range(None, None), Ok(()));
    }
}
