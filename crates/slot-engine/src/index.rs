//! Per-calendar sorted interval index.
//!
//! Sorts busy intervals by (start, end) with a stable sort and collapses exact
//! duplicates — same range, same source event, same attendees: the same
//! meeting recorded twice, e.g. by two collection passes. Built once per query,
//! never mutated afterwards. Construction is O(N log N).

use crate::event::{BusyInterval, CalendarId, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalIndex {
    calendar_id: CalendarId,
    intervals: Vec<BusyInterval>,
}

impl IntervalIndex {
    /// Build an index from unordered intervals.
    pub fn build(calendar_id: impl Into<CalendarId>, mut intervals: Vec<BusyInterval>) -> Self {
        intervals.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
        intervals.dedup_by(|next, kept| {
            next.start == kept.start
                && next.end == kept.end
                && next.source_event_id == kept.source_event_id
                && next.attendees == kept.attendees
        });
        IntervalIndex {
            calendar_id: calendar_id.into(),
            intervals,
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// Intervals in (start, end) ascending order.
    pub fn intervals(&self) -> &[BusyInterval] {
        &self.intervals
    }

    /// Earliest start and latest end across all intervals, for bounding
    /// sweep-line passes. `None` when the calendar is empty.
    pub fn total_span(&self) -> Option<(Instant, Instant)> {
        let min_start = self.intervals.first()?.start;
        let max_end = self.intervals.iter().map(|i| i.end).max()?;
        Some((min_start, max_end))
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}
