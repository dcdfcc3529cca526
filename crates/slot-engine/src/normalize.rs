//! Time normalization — the only place zoned or local timestamps are resolved.
//!
//! Converts raw event times (absolute, or wall-clock plus IANA zone) into
//! absolute UTC instants via `chrono-tz`. An ambiguous local time during
//! "fall back" resolves to the earlier of the two valid instants; a local time
//! that never occurred during "spring forward" is rejected. No local or zoned
//! value travels past this module.

use chrono::offset::LocalResult;
use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::NormalizeError;
use crate::event::{BusyInterval, CalendarSource, EventTime, Instant, RawEvent};

/// A skipped event recorded during batch normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationWarning {
    pub calendar_id: String,
    pub source_event_id: String,
    pub error: NormalizeError,
}

pub(crate) fn parse_zone(zone: &str) -> Result<Tz, NormalizeError> {
    zone.parse()
        .map_err(|_| NormalizeError::UnknownTimezone(zone.to_string()))
}

/// Resolve a wall-clock time in a zone to an absolute instant.
pub(crate) fn resolve_local(
    datetime: NaiveDateTime,
    tz: Tz,
) -> Result<Instant, NormalizeError> {
    match tz.from_local_datetime(&datetime) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // "Fall back": the wall-clock time occurred twice — take the earlier.
        LocalResult::Ambiguous(earlier, _later) => Ok(earlier.with_timezone(&Utc)),
        // "Spring forward": the wall-clock time never occurred.
        LocalResult::None => Err(NormalizeError::InvalidLocalTime(
            datetime.to_string(),
            tz.name().to_string(),
        )),
    }
}

fn resolve(time: &EventTime, fallback_zone: Option<&str>) -> Result<Instant, NormalizeError> {
    match time {
        EventTime::Absolute(dt) => Ok(*dt),
        EventTime::Local { datetime, zone } => {
            let zone = zone
                .as_deref()
                .or(fallback_zone)
                .ok_or(NormalizeError::MissingTimezone)?;
            resolve_local(*datetime, parse_zone(zone)?)
        }
    }
}

/// Normalize one raw event into a [`BusyInterval`].
///
/// `fallback_zone` is the calendar's declared default zone, used when a local
/// event time carries no zone id of its own. Supplying neither is a caller
/// contract violation and fails with `MissingTimezone`.
///
/// # Errors
/// Returns `NormalizeError::UnknownTimezone` for a zone id that is not a valid
/// IANA identifier, `InvalidLocalTime` for a wall-clock time inside a DST gap,
/// and `EndBeforeStart` when the normalized end is not after the start.
pub fn normalize(
    event: &RawEvent,
    calendar_id: &str,
    fallback_zone: Option<&str>,
) -> Result<BusyInterval, NormalizeError> {
    let start = resolve(&event.start, fallback_zone)?;
    let end = resolve(&event.end, fallback_zone)?;
    if end <= start {
        return Err(NormalizeError::EndBeforeStart { start, end });
    }
    Ok(BusyInterval {
        start,
        end,
        calendar_id: calendar_id.to_string(),
        source_event_id: event.source_event_id.clone(),
        attendees: event.attendees.iter().cloned().collect(),
        title: event.title.clone(),
        location: event.location.clone(),
    })
}

/// Normalize every event in a calendar source.
///
/// Never aborts on a bad event: failures are collected as warnings and the
/// rest of the batch is still normalized (partial-failure semantics).
pub fn normalize_batch(source: &CalendarSource) -> (Vec<BusyInterval>, Vec<NormalizationWarning>) {
    let mut intervals = Vec::with_capacity(source.events.len());
    let mut warnings = Vec::new();
    for event in &source.events {
        match normalize(event, &source.calendar_id, source.default_zone.as_deref()) {
            Ok(interval) => intervals.push(interval),
            Err(error) => warnings.push(NormalizationWarning {
                calendar_id: source.calendar_id.clone(),
                source_event_id: event.source_event_id.clone(),
                error,
            }),
        }
    }
    (intervals, warnings)
}

/// One-off overlap check between two separately-supplied zoned ranges, for
/// callers holding raw zoned input who don't want to build a full index.
///
/// Both ranges are normalized, then tested with the half-open convention:
/// ranges that merely touch do not overlap.
pub fn zoned_ranges_overlap(
    a: (&EventTime, &EventTime),
    b: (&EventTime, &EventTime),
    fallback_zone: Option<&str>,
) -> Result<bool, NormalizeError> {
    let (a_start, a_end) = (resolve(a.0, fallback_zone)?, resolve(a.1, fallback_zone)?);
    let (b_start, b_end) = (resolve(b.0, fallback_zone)?, resolve(b.1, fallback_zone)?);
    if a_end <= a_start {
        return Err(NormalizeError::EndBeforeStart {
            start: a_start,
            end: a_end,
        });
    }
    if b_end <= b_start {
        return Err(NormalizeError::EndBeforeStart {
            start: b_start,
            end: b_end,
        });
    }
    Ok(a_start < b_end && b_start < a_end)
}
