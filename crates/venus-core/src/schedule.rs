//! Manual-mode schedule slots
//!
//! The device holds ten write-only slots. It rejects (or silently misapplies)
//! slots that break its rules, and it offers no way to read them back, so every
//! slot is checked here before it is encoded.

use std::fmt;
use std::ops::BitOr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of slots the device exposes (indices 0-9)
pub const SLOT_COUNT: u8 = 10;

/// Smallest power magnitude the device accepts for a slot
pub const MIN_SLOT_POWER: u16 = 100;

/// Largest power magnitude the device accepts for a slot
pub const MAX_SLOT_POWER: u16 = 800;

const TIME_FORMAT: &str = "%H:%M";

/// Active-days bitmask (bit 0 = Monday ... bit 6 = Sunday)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekdays(u8);

impl Weekdays {
    pub const MONDAY: Self = Self(1);
    pub const TUESDAY: Self = Self(2);
    pub const WEDNESDAY: Self = Self(4);
    pub const THURSDAY: Self = Self(8);
    pub const FRIDAY: Self = Self(16);
    pub const SATURDAY: Self = Self(32);
    pub const SUNDAY: Self = Self(64);
    pub const WEEKDAYS: Self = Self(31);
    pub const WEEKEND: Self = Self(96);
    pub const ALL: Self = Self(127);

    /// Wrap raw bits; range is checked by [`ScheduleSlot::validate`]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        (1..=Self::ALL.0).contains(&self.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for Weekdays {
    /// "Daily", "Weekdays", "Weekend" or a list such as "Mon,Wed,Fri"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Weekdays, &str); 7] = [
            (Weekdays::MONDAY, "Mon"),
            (Weekdays::TUESDAY, "Tue"),
            (Weekdays::WEDNESDAY, "Wed"),
            (Weekdays::THURSDAY, "Thu"),
            (Weekdays::FRIDAY, "Fri"),
            (Weekdays::SATURDAY, "Sat"),
            (Weekdays::SUNDAY, "Sun"),
        ];
        match *self {
            Self::ALL => return f.write_str("Daily"),
            Self::WEEKDAYS => return f.write_str("Weekdays"),
            Self::WEEKEND => return f.write_str("Weekend"),
            _ => {}
        }
        let days: Vec<&str> = NAMES
            .iter()
            .filter(|(day, _)| self.contains(*day))
            .map(|(_, name)| *name)
            .collect();
        if days.is_empty() {
            write!(f, "none ({:#04x})", self.0)
        } else {
            f.write_str(&days.join(","))
        }
    }
}

impl BitOr for Weekdays {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Direction of energy flow while a slot is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotMode {
    Charging,
    Discharging,
}

impl SlotMode {
    /// Signed wire power: negative charges the battery, positive discharges it
    pub fn signed_power(self, magnitude: u16) -> i32 {
        match self {
            SlotMode::Charging => -i32::from(magnitude),
            SlotMode::Discharging => i32::from(magnitude),
        }
    }
}

impl fmt::Display for SlotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotMode::Charging => f.write_str("Charging"),
            SlotMode::Discharging => f.write_str("Discharging"),
        }
    }
}

/// One schedule entry as the caller describes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    /// Slot index, 0-9
    pub index: u8,
    /// Start of the active window (minute resolution)
    pub start: NaiveTime,
    /// End of the active window, strictly after `start` on the same day
    pub end: NaiveTime,
    /// Days the slot applies to
    pub days: Weekdays,
    /// Charge or discharge
    pub mode: SlotMode,
    /// Power magnitude in watts, 100-800
    pub power: u16,
    /// Whether the slot is active
    pub enabled: bool,
}

impl ScheduleSlot {
    /// Build an enabled slot from `HH:MM` strings
    pub fn new(
        index: u8,
        start: &str,
        end: &str,
        days: Weekdays,
        mode: SlotMode,
        power: u16,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            index,
            start: parse_time(start)?,
            end: parse_time(end)?,
            days,
            mode,
            power,
            enabled: true,
        })
    }

    /// The write that switches a slot off
    ///
    /// The device still checks the other fields of a disabling write, so they
    /// carry a harmless full-day window at minimum power.
    pub fn disabled(index: u8) -> Self {
        Self {
            index,
            start: NaiveTime::default(),
            end: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default(),
            days: Weekdays::ALL,
            mode: SlotMode::Discharging,
            power: MIN_SLOT_POWER,
            enabled: false,
        }
    }

    /// Check every device-enforced constraint
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.index >= SLOT_COUNT {
            return Err(ValidationError::SlotIndex(self.index));
        }
        if minute_of_day(self.end) <= minute_of_day(self.start) {
            return Err(ValidationError::TimeRange {
                start: format_time(self.start),
                end: format_time(self.end),
            });
        }
        if !(MIN_SLOT_POWER..=MAX_SLOT_POWER).contains(&self.power) {
            return Err(ValidationError::Power(self.power));
        }
        if !self.days.is_valid() {
            return Err(ValidationError::Days(self.days.bits()));
        }
        Ok(())
    }

    /// Power as sent on the wire
    pub fn signed_power(&self) -> i32 {
        self.mode.signed_power(self.power)
    }

    /// Validate and convert into the `manual_cfg` wire object
    pub fn to_manual_config(&self) -> Result<ManualConfig, ValidationError> {
        self.validate()?;
        Ok(ManualConfig {
            time_num: self.index,
            start_time: format_time(self.start),
            end_time: format_time(self.end),
            week_set: self.days.bits(),
            power: self.signed_power(),
            enable: u8::from(self.enabled),
        })
    }
}

/// `manual_cfg` object of an `ES.SetMode` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualConfig {
    pub time_num: u8,
    pub start_time: String,
    pub end_time: String,
    pub week_set: u8,
    pub power: i32,
    pub enable: u8,
}

/// Parse an `HH:MM` time of day
pub fn parse_time(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
        .map_err(|_| ValidationError::TimeFormat(s.to_string()))
}

/// Format a time of day as `HH:MM`
pub fn format_time(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slot(index: u8, start: &str, end: &str, power: u16, days: u8) -> ScheduleSlot {
        ScheduleSlot::new(
            index,
            start,
            end,
            Weekdays::from_bits(days),
            SlotMode::Discharging,
            power,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_slot_passes() {
        assert_eq!(slot(0, "08:30", "20:30", 500, 127).validate(), Ok(()));
        assert_eq!(slot(9, "00:00", "00:01", 100, 1).validate(), Ok(()));
        assert_eq!(slot(5, "12:00", "23:59", 800, 96).validate(), Ok(()));
    }

    #[test]
    fn test_slot_index_out_of_range() {
        assert_eq!(
            slot(10, "08:00", "09:00", 500, 127).validate(),
            Err(ValidationError::SlotIndex(10))
        );
        assert_eq!(
            slot(255, "08:00", "09:00", 500, 127).validate(),
            Err(ValidationError::SlotIndex(255))
        );
    }

    #[test]
    fn test_overnight_window_rejected() {
        let err = slot(0, "23:00", "07:00", 500, 127).validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::TimeRange {
                start: "23:00".into(),
                end: "07:00".into()
            }
        );
        assert_eq!(err.field(), "end_time");
    }

    #[test]
    fn test_equal_start_and_end_rejected() {
        assert!(matches!(
            slot(0, "10:00", "10:00", 500, 127).validate(),
            Err(ValidationError::TimeRange { .. })
        ));
    }

    #[test]
    fn test_seconds_are_ignored_when_comparing() {
        let mut s = slot(0, "10:00", "10:00", 500, 127);
        s.end = NaiveTime::from_hms_opt(10, 0, 30).unwrap();
        assert!(matches!(s.validate(), Err(ValidationError::TimeRange { .. })));
    }

    #[test]
    fn test_power_bounds() {
        assert_eq!(
            slot(0, "08:00", "09:00", 99, 127).validate(),
            Err(ValidationError::Power(99))
        );
        assert_eq!(
            slot(0, "08:00", "09:00", 801, 127).validate(),
            Err(ValidationError::Power(801))
        );
        assert_eq!(
            slot(0, "08:00", "09:00", 0, 127).validate(),
            Err(ValidationError::Power(0))
        );
    }

    #[test]
    fn test_days_bounds() {
        assert_eq!(
            slot(0, "08:00", "09:00", 500, 0).validate(),
            Err(ValidationError::Days(0))
        );
        assert_eq!(
            slot(0, "08:00", "09:00", 500, 128).validate(),
            Err(ValidationError::Days(128))
        );
    }

    #[test]
    fn test_signed_power_follows_mode() {
        for magnitude in [100u16, 250, 800] {
            let mut s = slot(1, "08:00", "09:00", magnitude, 127);
            s.mode = SlotMode::Charging;
            assert_eq!(s.signed_power(), -i32::from(magnitude));
            s.mode = SlotMode::Discharging;
            assert_eq!(s.signed_power(), i32::from(magnitude));
        }
    }

    #[test]
    fn test_manual_config_wire_shape() {
        let mut s = slot(3, "08:30", "20:30", 500, 31);
        s.mode = SlotMode::Charging;
        let cfg = s.to_manual_config().unwrap();
        assert_eq!(
            cfg,
            ManualConfig {
                time_num: 3,
                start_time: "08:30".into(),
                end_time: "20:30".into(),
                week_set: 31,
                power: -500,
                enable: 1,
            }
        );
    }

    #[test]
    fn test_manual_config_refuses_invalid_slot() {
        let s = slot(0, "23:00", "07:00", 500, 127);
        assert!(s.to_manual_config().is_err());
    }

    #[test]
    fn test_disabled_slot_is_valid() {
        for index in 0..SLOT_COUNT {
            let cfg = ScheduleSlot::disabled(index).to_manual_config().unwrap();
            assert_eq!(cfg.enable, 0);
            assert_eq!(cfg.start_time, "00:00");
            assert_eq!(cfg.end_time, "23:59");
            assert_eq!(cfg.week_set, 127);
            assert_eq!(cfg.power, 100);
        }
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert_eq!(
            parse_time("25:00"),
            Err(ValidationError::TimeFormat("25:00".into()))
        );
        assert!(parse_time("8h30").is_err());
        assert!(parse_time(" 07:15 ").is_ok());
    }

    #[test]
    fn test_weekdays_combine() {
        let days = Weekdays::MONDAY | Weekdays::FRIDAY;
        assert_eq!(days.bits(), 17);
        assert!(days.contains(Weekdays::FRIDAY));
        assert!(!days.contains(Weekdays::SUNDAY));
        assert_eq!(days.to_string(), "Mon,Fri");
        assert_eq!(
            (Weekdays::WEEKDAYS | Weekdays::WEEKEND).bits(),
            Weekdays::ALL.bits()
        );
    }

    #[test]
    fn test_weekdays_display() {
        assert_eq!(Weekdays::ALL.to_string(), "Daily");
        assert_eq!(Weekdays::WEEKEND.to_string(), "Weekend");
        assert_eq!((Weekdays::SATURDAY | Weekdays::TUESDAY).to_string(), "Tue,Sat");
        assert_eq!(Weekdays::from_bits(0).to_string(), "none (0x00)");
    }
}
