//! Command implementations for venus-cli

pub mod discover;
pub mod info;
pub mod mode;
pub mod schedule;
pub mod status;

pub use discover::discover;
pub use info::info;
pub use mode::{mode, set_mode};
pub use schedule::{clear_schedules, schedule};
pub use status::status;
