//! Core data model: raw events, normalized busy intervals, and computed slots.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// An absolute point in time. Every comparison and arithmetic operation inside
/// the engine happens on this type; zoned and local representations exist only
/// at the input/output boundary and are resolved by [`crate::normalize`].
pub type Instant = DateTime<Utc>;

/// Stable person identifier (email or similar).
pub type PersonId = String;

/// Opaque calendar identifier.
pub type CalendarId = String;

/// A start or end time as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    /// Already absolute — passes through normalization unchanged.
    Absolute(DateTime<Utc>),
    /// Wall-clock time plus an optional IANA zone id. When `zone` is `None`,
    /// the calendar's declared default zone applies.
    Local {
        datetime: NaiveDateTime,
        zone: Option<String>,
    },
}

/// A raw calendar event before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub source_event_id: String,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<PersonId>,
    pub title: Option<String>,
    pub location: Option<String>,
}

/// One calendar's raw events plus its declared default zone — the per-calendar
/// input unit of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSource {
    pub calendar_id: CalendarId,
    /// Fallback zone for events supplied as local times without a zone id.
    pub default_zone: Option<String>,
    pub events: Vec<RawEvent>,
}

/// A normalized, immutable busy interval. Invariant: `start < end`.
///
/// Results copy the fields they need — nothing returned by a query references
/// caller-owned data, so callers may drop or mutate their event lists as soon
/// as the query returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: Instant,
    pub end: Instant,
    pub calendar_id: CalendarId,
    pub source_event_id: String,
    /// Ordered set — iteration order is deterministic.
    pub attendees: BTreeSet<PersonId>,
    pub title: Option<String>,
    pub location: Option<String>,
}

impl BusyInterval {
    /// Half-open overlap test: an interval ending exactly when another starts
    /// does not overlap it.
    pub fn overlaps(&self, other: &BusyInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A computed free time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: Instant,
    pub end: Instant,
    pub duration_minutes: i64,
}

impl TimeSlot {
    pub(crate) fn new(start: Instant, end: Instant) -> Self {
        TimeSlot {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}
