//! venus-core - Core types for Venus battery-storage devices
//!
//! This crate holds the data model shared by the UDP protocol engine and its
//! callers: discovered device descriptors, typed status payloads, operating
//! modes, and the schedule-slot rules the device enforces on writes.
//!
//! Nothing here performs I/O.

pub mod error;
pub mod models;
pub mod schedule;

pub use error::ValidationError;
pub use models::*;
pub use schedule::{ManualConfig, ScheduleSlot, SlotMode, Weekdays, SLOT_COUNT};
