//! Error types for slot-engine operations.
//!
//! Two layers: `NormalizeError` is per-event and recoverable — batch calls
//! collect these as warnings and keep going. `EngineError` is query-level and
//! fatal — a bad policy or window rejects the whole query before any
//! computation starts. `Internal` is neither: it signals a broken invariant
//! inside the engine itself, so callers can tell "your data was odd" apart
//! from "the engine is broken".

use serde::Serialize;
use thiserror::Error;

use crate::event::Instant;

/// Per-event normalization failure. The offending event is skipped and
/// reported; the rest of the batch still normalizes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NormalizeError {
    #[error("event has a local time but no zone id, and the calendar declares no default zone")]
    MissingTimezone,

    #[error("local time {0} does not exist in {1} (DST gap)")]
    InvalidLocalTime(String, String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("event end {end} is not after start {start}")]
    EndBeforeStart { start: Instant, end: Instant },
}

/// Query-level failure.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
