//! # slot-engine
//!
//! Deterministic multi-calendar availability and conflict detection.
//!
//! Given per-calendar busy events, the engine finds time windows where every
//! calendar is simultaneously free for a requested duration, and separately
//! detects overlapping meetings and attendee double-booking across calendars.
//! All interval arithmetic runs on absolute UTC instants; local and zoned
//! timestamps are resolved once at the input boundary (DST rules included) and
//! never travel deeper into the engine.
//!
//! Queries are pure computations over immutable per-query indexes with no
//! shared state, so identical inputs always produce identical outputs —
//! including result ordering.
//!
//! ## Modules
//!
//! - [`event`] — core data model (raw events, busy intervals, slots)
//! - [`normalize`] — zoned/local time → absolute instant
//! - [`index`] — per-calendar sorted interval index
//! - [`availability`] — free slots per calendar and common free time across calendars
//! - [`conflict`] — overlap and double-booking detection
//! - [`policy`] — working hours, buffers, minimum duration, result cap
//! - [`error`] — error types

pub mod availability;
pub mod conflict;
pub mod error;
pub mod event;
pub mod index;
pub mod normalize;
pub mod policy;

pub use availability::{
    availability_query, first_slot, free_slots, working_window, AvailabilityResponse,
};
pub use conflict::{
    conflict_query, find_attendee_conflicts, find_overlaps, AttendeeConflict, ConflictReport,
    OverlapConflict, OverlapSeverity,
};
pub use error::{EngineError, NormalizeError, Result};
pub use event::{
    BusyInterval, CalendarId, CalendarSource, EventTime, Instant, PersonId, RawEvent, TimeSlot,
};
pub use index::IntervalIndex;
pub use normalize::{normalize, normalize_batch, zoned_ranges_overlap, NormalizationWarning};
pub use policy::SlotPolicy;
