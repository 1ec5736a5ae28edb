//! Local validation errors

use thiserror::Error;

/// A write payload failed a device-enforced constraint before anything was sent
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Slot index outside 0-9
    #[error("Slot index {0} out of range (0-9)")]
    SlotIndex(u8),

    /// End time not strictly after start time
    #[error("End time {end} must be after start time {start}")]
    TimeRange { start: String, end: String },

    /// Power magnitude outside 100-800 W
    #[error("Power {0} W out of range (100-800)")]
    Power(u16),

    /// Active-days bitmask outside 1-127
    #[error("Days bitmask {0} out of range (1-127)")]
    Days(u8),

    /// Time string not in HH:MM form
    #[error("Invalid time '{0}', expected HH:MM")]
    TimeFormat(String),
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::SlotIndex(_) => "slot",
            ValidationError::TimeRange { .. } => "end_time",
            ValidationError::Power(_) => "power",
            ValidationError::Days(_) => "days",
            ValidationError::TimeFormat(_) => "time",
        }
    }
}
