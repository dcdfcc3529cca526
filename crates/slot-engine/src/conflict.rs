//! Conflict detection: interval overlaps and attendee double-booking.
//!
//! Both detectors run on raw intervals. Buffers shape free-slot output only;
//! they never create or hide conflicts. Half-open convention throughout: a
//! meeting ending exactly when another starts is not a conflict.
//!
//! Overlap detection is a sweep over the globally sorted interval stream with
//! an active set keyed by end time — O(M log M + C) for M intervals and C
//! reported conflicts, instead of comparing every pair.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use serde::Serialize;
use tracing::debug;

use crate::event::{BusyInterval, CalendarSource, Instant, PersonId};
use crate::index::IntervalIndex;
use crate::normalize::{normalize_batch, NormalizationWarning};

/// How much of an overlapping pair is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverlapSeverity {
    /// The ranges partially overlap.
    Partial,
    /// One range entirely contains the other (or they coincide).
    Full,
}

/// Two busy intervals (possibly from different calendars) overlapping in time.
///
/// Each unordered pair is reported once, with `interval_a` the member sorting
/// earlier by (start, end, calendar, event id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapConflict {
    pub interval_a: BusyInterval,
    pub interval_b: BusyInterval,
    pub overlap_minutes: i64,
    pub severity: OverlapSeverity,
}

/// One person booked into two or more overlapping meetings.
///
/// A single record per person: someone triple-booked at the same time gets one
/// entry listing all three meetings, not three pairwise entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendeeConflict {
    pub person: PersonId,
    /// Every meeting of this person overlapping another of theirs, sorted by
    /// (start, end). Always at least two.
    pub meetings: Vec<BusyInterval>,
}

/// Result of a conflict query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictReport {
    pub overlaps: Vec<OverlapConflict>,
    pub attendee_conflicts: Vec<AttendeeConflict>,
    pub warnings: Vec<NormalizationWarning>,
}

fn interval_key(i: &BusyInterval) -> (Instant, Instant, &str, &str) {
    (i.start, i.end, i.calendar_id.as_str(), i.source_event_id.as_str())
}

fn make_overlap(x: &BusyInterval, y: &BusyInterval) -> OverlapConflict {
    let (a, b) = if interval_key(x) <= interval_key(y) {
        (x, y)
    } else {
        (y, x)
    };
    let overlap_start = a.start.max(b.start);
    let overlap_end = a.end.min(b.end);
    let severity = if (a.start <= b.start && a.end >= b.end)
        || (b.start <= a.start && b.end >= a.end)
    {
        OverlapSeverity::Full
    } else {
        OverlapSeverity::Partial
    };
    OverlapConflict {
        interval_a: a.clone(),
        interval_b: b.clone(),
        overlap_minutes: (overlap_end - overlap_start).num_minutes(),
        severity,
    }
}

/// Find every pair of overlapping intervals across the given calendars.
///
/// Returns conflicts sorted by the earliest start involved, then by the full
/// identity of both members, so repeated queries are byte-identical.
pub fn find_overlaps(indexes: &[IntervalIndex]) -> Vec<OverlapConflict> {
    let mut all: Vec<&BusyInterval> = indexes
        .iter()
        .flat_map(|index| index.intervals().iter())
        .collect();
    all.sort_by(|a, b| interval_key(a).cmp(&interval_key(b)));

    // Active set ordered by end time. Everything still in it after expiry
    // popping ends strictly after the incoming interval's start, so each
    // remaining member overlaps it.
    let mut active: BinaryHeap<Reverse<(Instant, usize)>> = BinaryHeap::new();
    let mut conflicts = Vec::new();

    for (idx, interval) in all.iter().enumerate() {
        while let Some(&Reverse((end, _))) = active.peek() {
            if end <= interval.start {
                active.pop();
            } else {
                break;
            }
        }
        for &Reverse((_, open_idx)) in active.iter() {
            conflicts.push(make_overlap(all[open_idx], interval));
        }
        active.push(Reverse((interval.end, idx)));
    }

    conflicts.sort_by(|a, b| {
        interval_key(&a.interval_a)
            .cmp(&interval_key(&b.interval_a))
            .then_with(|| interval_key(&a.interval_b).cmp(&interval_key(&b.interval_b)))
    });
    conflicts
}

/// Find per-person double-booking across all calendars.
///
/// A meeting belongs to a person's conflict record when it overlaps at least
/// one other meeting of that same person. Intervals with no attendees
/// contribute nothing here (they are still eligible for overlap detection).
/// Records come back sorted by earliest meeting start, then person.
pub fn find_attendee_conflicts(indexes: &[IntervalIndex]) -> Vec<AttendeeConflict> {
    // BTreeMap keeps person iteration deterministic.
    let mut by_person: BTreeMap<&str, Vec<&BusyInterval>> = BTreeMap::new();
    for index in indexes {
        for interval in index.intervals() {
            for person in &interval.attendees {
                by_person.entry(person).or_default().push(interval);
            }
        }
    }

    let mut conflicts = Vec::new();
    for (person, mut meetings) in by_person {
        if meetings.len() < 2 {
            continue;
        }
        meetings.sort_by(|a, b| interval_key(a).cmp(&interval_key(b)));

        // With starts sorted ascending, meeting i overlaps an earlier one iff
        // the running max end before i passes i's start, and overlaps a later
        // one iff the very next start falls before i's end.
        let n = meetings.len();
        let mut involved = vec![false; n];
        let mut max_end = meetings[0].end;
        for i in 1..n {
            if meetings[i].start < max_end {
                involved[i] = true;
            }
            max_end = max_end.max(meetings[i].end);
        }
        for i in 0..n - 1 {
            if meetings[i + 1].start < meetings[i].end {
                involved[i] = true;
            }
        }

        let overlapping: Vec<BusyInterval> = meetings
            .iter()
            .zip(&involved)
            .filter(|(_, &hit)| hit)
            .map(|(m, _)| (*m).clone())
            .collect();
        if overlapping.len() >= 2 {
            conflicts.push(AttendeeConflict {
                person: person.to_string(),
                meetings: overlapping,
            });
        }
    }

    conflicts.sort_by(|a, b| {
        let a_start = a.meetings[0].start;
        let b_start = b.meetings[0].start;
        a_start.cmp(&b_start).then_with(|| a.person.cmp(&b.person))
    });
    conflicts
}

/// Full conflict pipeline over raw calendar sources: normalize with collected
/// warnings, index per calendar, run both detectors.
pub fn conflict_query(sources: &[CalendarSource]) -> ConflictReport {
    let mut warnings = Vec::new();
    let mut indexes = Vec::with_capacity(sources.len());
    for source in sources {
        let (intervals, mut batch_warnings) = normalize_batch(source);
        warnings.append(&mut batch_warnings);
        indexes.push(IntervalIndex::build(source.calendar_id.clone(), intervals));
    }

    debug!(calendars = indexes.len(), "conflict query");

    ConflictReport {
        overlaps: find_overlaps(&indexes),
        attendee_conflicts: find_attendee_conflicts(&indexes),
        warnings,
    }
}
