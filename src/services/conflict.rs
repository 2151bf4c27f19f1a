use crate::models::TimeInterval;

/// Whether `candidate` overlaps `other`, or sits closer to it than `buffer_minutes`
/// on either side. A gap of exactly `buffer_minutes` is allowed.
///
/// Intervals on different dates never conflict. Both intervals must have
/// `start < end`.
pub fn conflicts_with(candidate: &TimeInterval, other: &TimeInterval, buffer_minutes: u32) -> bool {
    if candidate.date != other.date {
        return false;
    }

    let c_start = candidate.start.minutes() as i64;
    let c_end = candidate.end.minutes() as i64;
    let o_start = other.start.minutes() as i64;
    let o_end = other.end.minutes() as i64;
    let buffer = buffer_minutes as i64;

    let overlaps = c_start < o_end && c_end > o_start;
    let too_close_after = (c_start - o_end).abs() < buffer;
    let too_close_before = (o_start - c_end).abs() < buffer;

    overlaps || too_close_after || too_close_before
}

pub fn has_conflict<'a, I>(candidate: &TimeInterval, existing: I, buffer_minutes: u32) -> bool
where
    I: IntoIterator<Item = &'a TimeInterval>,
{
    existing
        .into_iter()
        .any(|other| conflicts_with(candidate, other, buffer_minutes))
}
