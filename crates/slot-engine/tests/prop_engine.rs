//! Property-based tests for the availability and conflict engines.
//!
//! These verify invariants that should hold for *any* input, not just the
//! examples in the other test files: determinism, busy/free complement,
//! intersection soundness and completeness, buffer monotonicity, overlap
//! symmetry, and attendee-conflict grouping.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::{
    availability_query, conflict_query, find_attendee_conflicts, find_overlaps, free_slots,
    BusyInterval, CalendarSource, EventTime, Instant, IntervalIndex, RawEvent, SlotPolicy,
};

// ---------------------------------------------------------------------------
// Strategies — minute-aligned intervals inside a fixed 08:00-18:00 UTC window
// ---------------------------------------------------------------------------

const WINDOW_MINUTES: i64 = 600;

fn window_start() -> Instant {
    Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap()
}

fn window_end() -> Instant {
    window_start() + Duration::minutes(WINDOW_MINUTES)
}

/// (start, end) offsets in minutes from window start. End may poke past the
/// window; the engine clips it.
fn arb_range() -> impl Strategy<Value = (i64, i64)> {
    (0i64..540, 15i64..=120).prop_map(|(start, len)| (start, start + len))
}

fn arb_calendar() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec(arb_range(), 0..8)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at(minutes: i64) -> Instant {
    window_start() + Duration::minutes(minutes)
}

fn busy(calendar_id: &str, n: usize, range: (i64, i64), attendees: &[&str]) -> BusyInterval {
    BusyInterval {
        start: at(range.0),
        end: at(range.1),
        calendar_id: calendar_id.to_string(),
        source_event_id: format!("{}-{}", calendar_id, n),
        attendees: attendees.iter().map(|a| a.to_string()).collect(),
        title: None,
        location: None,
    }
}

fn build_index(calendar_id: &str, ranges: &[(i64, i64)], attendees: &[&str]) -> IntervalIndex {
    let intervals = ranges
        .iter()
        .enumerate()
        .map(|(n, &range)| busy(calendar_id, n, range, attendees))
        .collect();
    IntervalIndex::build(calendar_id, intervals)
}

fn build_source(calendar_id: &str, ranges: &[(i64, i64)]) -> CalendarSource {
    CalendarSource {
        calendar_id: calendar_id.to_string(),
        default_zone: None,
        events: ranges
            .iter()
            .enumerate()
            .map(|(n, &(s, e))| RawEvent {
                source_event_id: format!("{}-{}", calendar_id, n),
                start: EventTime::Absolute(at(s)),
                end: EventTime::Absolute(at(e)),
                attendees: vec!["ana".to_string()],
                title: None,
                location: None,
            })
            .collect(),
    }
}

fn permissive_policy(buffer: i64) -> SlotPolicy {
    SlotPolicy {
        working_hours: (8, 18),
        buffer_minutes: buffer,
        min_duration_minutes: 1,
        max_results: 500,
    }
}

/// Reference merge: clip to the window, sort, coalesce, total busy minutes.
fn merged_busy_minutes(calendars: &[&[(i64, i64)]]) -> i64 {
    let mut clipped: Vec<(i64, i64)> = calendars
        .iter()
        .flat_map(|ranges| ranges.iter())
        .filter(|&&(s, e)| s < WINDOW_MINUTES && e > 0)
        .map(|&(s, e)| (s.max(0), e.min(WINDOW_MINUTES)))
        .collect();
    clipped.sort();

    let mut total = 0;
    let mut current: Option<(i64, i64)> = None;
    for (s, e) in clipped {
        match current {
            Some((cs, ce)) if s <= ce => current = Some((cs, ce.max(e))),
            Some((cs, ce)) => {
                total += ce - cs;
                current = Some((s, e));
            }
            None => current = Some((s, e)),
        }
    }
    if let Some((cs, ce)) = current {
        total += ce - cs;
    }
    total
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: Determinism — repeating a query yields identical results
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn queries_are_deterministic(a in arb_calendar(), b in arb_calendar()) {
        let sources = vec![build_source("a", &a), build_source("b", &b)];
        let day = window_start().date_naive();
        let policy = permissive_policy(0);

        let first = availability_query(&sources, day, day, "UTC", 1, &policy).unwrap();
        let second = availability_query(&sources, day, day, "UTC", 1, &policy).unwrap();
        prop_assert_eq!(first, second);

        let report_one = conflict_query(&sources);
        let report_two = conflict_query(&sources);
        prop_assert_eq!(report_one, report_two);
    }
}

// ---------------------------------------------------------------------------
// Property 2: Complement — free + busy exactly tile the window (no buffer)
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn free_and_busy_tile_the_window(ranges in arb_calendar()) {
        let index = build_index("cal", &ranges, &[]);
        let slots = free_slots(&[index], window_start(), window_end(), &permissive_policy(0), 1)
            .unwrap();

        let free_total: i64 = slots.iter().map(|s| s.duration_minutes).sum();
        let busy_total = merged_busy_minutes(&[ranges.as_slice()]);
        prop_assert_eq!(free_total + busy_total, WINDOW_MINUTES);

        // Slots are disjoint, ordered, and inside the window.
        for pair in slots.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for slot in &slots {
            prop_assert!(slot.start >= window_start() && slot.end <= window_end());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Intersection — common slots are free in *every* calendar, and
// together with the merged busy time they cover the whole window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn intersection_is_sound_and_complete(
        a in arb_calendar(),
        b in arb_calendar(),
        c in arb_calendar(),
    ) {
        let indexes = vec![
            build_index("a", &a, &[]),
            build_index("b", &b, &[]),
            build_index("c", &c, &[]),
        ];
        let slots = free_slots(&indexes, window_start(), window_end(), &permissive_policy(0), 1)
            .unwrap();

        // Soundness: no slot touches any calendar's busy time.
        for slot in &slots {
            for index in &indexes {
                for interval in index.intervals() {
                    prop_assert!(
                        slot.end <= interval.start || interval.end <= slot.start,
                        "slot {:?} overlaps busy {:?}",
                        slot,
                        interval
                    );
                }
            }
        }

        // Completeness: every minute is either common-free or busy somewhere.
        let free_total: i64 = slots.iter().map(|s| s.duration_minutes).sum();
        let busy_total = merged_busy_minutes(&[a.as_slice(), b.as_slice(), c.as_slice()]);
        prop_assert_eq!(free_total + busy_total, WINDOW_MINUTES);
    }
}

// ---------------------------------------------------------------------------
// Property 4: Buffer monotonicity — more buffer never means more free time
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn larger_buffer_never_adds_free_time(
        ranges in arb_calendar(),
        small in 0i64..30,
        extra in 0i64..30,
    ) {
        let index = build_index("cal", &ranges, &[]);
        let tight = free_slots(
            &[index.clone()],
            window_start(),
            window_end(),
            &permissive_policy(small),
            1,
        )
        .unwrap();
        let loose = free_slots(
            &[index],
            window_start(),
            window_end(),
            &permissive_policy(small + extra),
            1,
        )
        .unwrap();

        let tight_total: i64 = tight.iter().map(|s| s.duration_minutes).sum();
        let loose_total: i64 = loose.iter().map(|s| s.duration_minutes).sum();
        prop_assert!(loose_total <= tight_total);
        prop_assert!(loose.len() <= tight.len());
    }
}

// ---------------------------------------------------------------------------
// Property 5: Overlap symmetry — each unordered pair once, with the exact
// intersection length, matching a brute-force pairwise scan
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn overlaps_match_brute_force(a in arb_calendar(), b in arb_calendar()) {
        let indexes = vec![build_index("a", &a, &[]), build_index("b", &b, &[])];
        let conflicts = find_overlaps(&indexes);

        let all: Vec<&BusyInterval> = indexes
            .iter()
            .flat_map(|index| index.intervals().iter())
            .collect();
        let mut expected = 0;
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                if all[i].overlaps(all[j]) {
                    expected += 1;
                }
            }
        }
        prop_assert_eq!(conflicts.len(), expected);

        let mut seen = std::collections::HashSet::new();
        for conflict in &conflicts {
            let expected_minutes = (conflict.interval_a.end.min(conflict.interval_b.end)
                - conflict.interval_a.start.max(conflict.interval_b.start))
            .num_minutes();
            prop_assert_eq!(conflict.overlap_minutes, expected_minutes);
            prop_assert!(conflict.overlap_minutes > 0);

            // Canonical member order, and no pair reported twice.
            prop_assert!(conflict.interval_a.start <= conflict.interval_b.start);
            let key = (
                conflict.interval_a.calendar_id.clone(),
                conflict.interval_a.source_event_id.clone(),
                conflict.interval_b.calendar_id.clone(),
                conflict.interval_b.source_event_id.clone(),
            );
            prop_assert!(seen.insert(key), "pair reported twice");
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: Attendee grouping — at most one record per person
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn one_attendee_record_per_person(a in arb_calendar(), b in arb_calendar()) {
        let indexes = vec![
            build_index("a", &a, &["ana", "bob"]),
            build_index("b", &b, &["ana"]),
        ];
        let conflicts = find_attendee_conflicts(&indexes);

        let mut persons = std::collections::HashSet::new();
        for conflict in &conflicts {
            prop_assert!(
                persons.insert(conflict.person.clone()),
                "person {} appears in more than one record",
                conflict.person
            );
            prop_assert!(conflict.meetings.len() >= 2);
            // Every listed meeting overlaps at least one other listed meeting.
            for m in &conflict.meetings {
                prop_assert!(
                    conflict.meetings.iter().any(|other| other != m && m.overlaps(other)),
                    "meeting {:?} overlaps nothing else in the record",
                    m
                );
            }
        }
    }
}
