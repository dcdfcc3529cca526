//! Free-slot computation for one calendar and across many.
//!
//! All busy intervals from all queried calendars are flattened into one sorted
//! boundary-event stream and swept once with an open-interval counter: a
//! point in time is common-free exactly when the counter is zero. That keeps
//! the multi-calendar intersection at O(M log M) in the total interval count
//! instead of comparing calendars pairwise. Free slots are the gaps between
//! merged busy blocks, shrunk by the policy buffer and filtered by minimum
//! duration.

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::event::{CalendarSource, Instant, TimeSlot};
use crate::index::IntervalIndex;
use crate::normalize::{self, NormalizationWarning};
use crate::policy::SlotPolicy;

/// Result of an availability query: slots plus per-event warnings for any
/// input events that failed normalization and were skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityResponse {
    /// Free slots ordered by start, truncated to the policy's `max_results`.
    pub slots: Vec<TimeSlot>,
    pub warnings: Vec<NormalizationWarning>,
}

/// Build the `[day_start, day_end)` instant pair for one date's working hours
/// in the given zone.
///
/// DST-aware: an ambiguous local hour resolves to the earlier instant; a
/// working hour that falls inside a DST gap fails rather than guessing.
pub fn working_window(date: NaiveDate, tz: Tz, policy: &SlotPolicy) -> Result<(Instant, Instant)> {
    let (h1, h2) = policy.working_hours;
    let start_local = date
        .and_hms_opt(h1, 0, 0)
        .ok_or_else(|| EngineError::InvalidWindow(format!("bad start hour {}", h1)))?;
    let end_local = if h2 == 24 {
        date.succ_opt()
            .ok_or_else(|| EngineError::InvalidWindow("date out of range".to_string()))?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| EngineError::InvalidWindow("date out of range".to_string()))?
    } else {
        date.and_hms_opt(h2, 0, 0)
            .ok_or_else(|| EngineError::InvalidWindow(format!("bad end hour {}", h2)))?
    };
    // A working hour inside a DST gap is a window-construction failure, not a
    // per-event one: keep it in the query-fatal layer.
    let start = normalize::resolve_local(start_local, tz)
        .map_err(|e| EngineError::InvalidWindow(e.to_string()))?;
    let end = normalize::resolve_local(end_local, tz)
        .map_err(|e| EngineError::InvalidWindow(e.to_string()))?;
    if start >= end {
        return Err(EngineError::InvalidWindow(format!(
            "window for {} collapsed: {} >= {}",
            date, start, end
        )));
    }
    Ok((start, end))
}

/// Merge all calendars' busy intervals within the window into non-overlapping
/// blocks via a single boundary sweep.
///
/// Touching blocks coalesce. Returns blocks sorted by start.
fn merged_busy(
    indexes: &[IntervalIndex],
    window_start: Instant,
    window_end: Instant,
) -> Result<Vec<(Instant, Instant)>> {
    // +1 at each clipped interval start, -1 at each clipped end. At equal
    // instants starts sort before ends so adjacent blocks merge.
    let mut bounds: Vec<(Instant, i32)> = Vec::new();
    for index in indexes {
        for interval in index.intervals() {
            if interval.start < window_end && interval.end > window_start {
                bounds.push((interval.start.max(window_start), 1));
                bounds.push((interval.end.min(window_end), -1));
            }
        }
    }
    bounds.sort_by_key(|&(at, delta)| (at, -delta));

    let mut merged = Vec::new();
    let mut depth = 0i32;
    let mut block_start: Option<Instant> = None;
    for (at, delta) in bounds {
        if delta == 1 && depth == 0 {
            block_start = Some(at);
        }
        depth += delta;
        if depth < 0 {
            return Err(EngineError::Internal(
                "busy counter went negative during sweep".to_string(),
            ));
        }
        if depth == 0 {
            if let Some(start) = block_start.take() {
                if at > start {
                    merged.push((start, at));
                }
            }
        }
    }
    Ok(merged)
}

/// Compute free slots within `[window_start, window_end)` across every given
/// calendar index. Pass a single index for the single-calendar case.
///
/// A cursor walks the merged busy blocks once: the gap before each block,
/// shrunk by `buffer_minutes` on both sides, becomes a candidate slot, kept
/// when it is at least `max(min_duration_minutes, requested_duration_minutes)`
/// long. A query over calendars with no events returns the whole window as one
/// slot.
pub fn free_slots(
    indexes: &[IntervalIndex],
    window_start: Instant,
    window_end: Instant,
    policy: &SlotPolicy,
    requested_duration_minutes: i64,
) -> Result<Vec<TimeSlot>> {
    let min_duration = Duration::minutes(
        policy.min_duration_minutes.max(requested_duration_minutes),
    );
    let buffer = Duration::minutes(policy.buffer_minutes);

    let mut slots = Vec::new();
    let mut cursor = window_start;
    for (busy_start, busy_end) in merged_busy(indexes, window_start, window_end)? {
        let slot_end = busy_start - buffer;
        if slot_end > cursor && slot_end - cursor >= min_duration {
            slots.push(TimeSlot::new(cursor, slot_end));
        }
        cursor = cursor.max(busy_end + buffer);
    }
    if cursor < window_end && window_end - cursor >= min_duration {
        slots.push(TimeSlot::new(cursor, window_end));
    }
    Ok(slots)
}

/// First slot satisfying the policy and requested duration, if any.
pub fn first_slot(
    indexes: &[IntervalIndex],
    window_start: Instant,
    window_end: Instant,
    policy: &SlotPolicy,
    requested_duration_minutes: i64,
) -> Result<Option<TimeSlot>> {
    let slots = free_slots(
        indexes,
        window_start,
        window_end,
        policy,
        requested_duration_minutes,
    )?;
    Ok(slots.into_iter().next())
}

/// Full availability pipeline over raw calendar sources.
///
/// Validates the policy up front (fail fast, no partial result), normalizes
/// each calendar's events collecting per-event warnings, builds one index per
/// calendar, then computes common free slots for every date in the inclusive
/// `[start_date, end_date]` range using working hours interpreted in `zone`.
/// Slots come back ordered by start ascending; when `max_results` truncates,
/// the earliest slots win.
///
/// # Errors
/// `InvalidPolicy` for bad policy fields or a non-positive requested duration,
/// `InvalidWindow` for an inverted date range, `UnknownTimezone` (via the
/// normalization error) for a bad `zone`.
pub fn availability_query(
    sources: &[CalendarSource],
    start_date: NaiveDate,
    end_date: NaiveDate,
    zone: &str,
    requested_duration_minutes: i64,
    policy: &SlotPolicy,
) -> Result<AvailabilityResponse> {
    policy.validate()?;
    if requested_duration_minutes <= 0 {
        return Err(EngineError::InvalidPolicy(format!(
            "requested_duration_minutes: {} must be positive",
            requested_duration_minutes
        )));
    }
    if start_date > end_date {
        return Err(EngineError::InvalidWindow(format!(
            "start date {} is after end date {}",
            start_date, end_date
        )));
    }
    let tz = normalize::parse_zone(zone)?;

    debug!(
        calendars = sources.len(),
        %start_date,
        %end_date,
        requested_duration_minutes,
        "availability query"
    );

    let mut warnings = Vec::new();
    let mut indexes = Vec::with_capacity(sources.len());
    for source in sources {
        let (intervals, mut batch_warnings) = normalize::normalize_batch(source);
        warnings.append(&mut batch_warnings);
        indexes.push(IntervalIndex::build(source.calendar_id.clone(), intervals));
    }

    let mut slots = Vec::new();
    let mut date = start_date;
    loop {
        let (day_start, day_end) = working_window(date, tz, policy)?;
        slots.extend(free_slots(
            &indexes,
            day_start,
            day_end,
            policy,
            requested_duration_minutes,
        )?);
        if date == end_date {
            break;
        }
        date = date
            .succ_opt()
            .ok_or_else(|| EngineError::InvalidWindow("date out of range".to_string()))?;
    }

    slots.truncate(policy.max_results);
    Ok(AvailabilityResponse { slots, warnings })
}
