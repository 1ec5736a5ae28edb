//! Shared data models for Venus devices

mod device;
mod flag;
mod mode;
mod status;

pub use device::*;
pub use mode::*;
pub use status::*;
