//! Caller-supplied scheduling policy.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Constraints applied when computing free slots.
///
/// Validated once at query entry; an invalid field rejects the whole query
/// before any computation starts. Buffers shape free-slot output only — they
/// never create or hide conflicts, which are always detected on the raw
/// intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPolicy {
    /// Working hours as local (start_hour, end_hour), end exclusive.
    /// An end hour of 24 means midnight of the following day.
    pub working_hours: (u32, u32),
    /// Minutes of free air required before and after each busy block.
    pub buffer_minutes: i64,
    /// Shortest slot worth returning, in minutes.
    pub min_duration_minutes: i64,
    /// Result cap; the earliest slots are kept when truncating.
    pub max_results: usize,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        SlotPolicy {
            working_hours: (9, 17),
            buffer_minutes: 0,
            min_duration_minutes: 30,
            max_results: 50,
        }
    }
}

impl SlotPolicy {
    /// Check every field, naming the offending one in the error message.
    pub fn validate(&self) -> Result<(), EngineError> {
        let (h1, h2) = self.working_hours;
        if h1 >= h2 || h2 > 24 {
            return Err(EngineError::InvalidPolicy(format!(
                "working_hours: start hour {} must be before end hour {} (end at most 24)",
                h1, h2
            )));
        }
        if self.buffer_minutes < 0 {
            return Err(EngineError::InvalidPolicy(format!(
                "buffer_minutes: {} must not be negative",
                self.buffer_minutes
            )));
        }
        if self.min_duration_minutes <= 0 {
            return Err(EngineError::InvalidPolicy(format!(
                "min_duration_minutes: {} must be positive",
                self.min_duration_minutes
            )));
        }
        if self.max_results == 0 {
            return Err(EngineError::InvalidPolicy(
                "max_results: must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
