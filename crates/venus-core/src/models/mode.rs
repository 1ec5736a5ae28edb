//! Operating modes and the `ES.SetMode` / `ES.GetMode` payloads

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::flag;
use crate::error::ValidationError;
use crate::schedule::{ManualConfig, ScheduleSlot};

/// Mode name as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeName {
    Auto,
    #[serde(rename = "AI")]
    Ai,
    Manual,
    Passive,
    /// A mode this client does not know about
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeName::Auto => "Auto",
            ModeName::Ai => "AI",
            ModeName::Manual => "Manual",
            ModeName::Passive => "Passive",
            ModeName::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for ModeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ModeName::Auto),
            "ai" => Ok(ModeName::Ai),
            "manual" => Ok(ModeName::Manual),
            "passive" => Ok(ModeName::Passive),
            other => Err(format!("Unknown mode '{}'", other)),
        }
    }
}

/// Result of `ES.GetMode`: current mode plus live power and CT meter readings
///
/// The device never reports Manual slot contents here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySystemMode {
    #[serde(default)]
    pub mode: Option<ModeName>,
    #[serde(default)]
    pub ongrid_power: Option<f64>,
    #[serde(default)]
    pub offgrid_power: Option<f64>,
    #[serde(default)]
    pub bat_soc: Option<f64>,
    /// CT meter connected
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub ct_state: Option<bool>,
    #[serde(default)]
    pub a_power: Option<f64>,
    #[serde(default)]
    pub b_power: Option<f64>,
    #[serde(default)]
    pub c_power: Option<f64>,
    #[serde(default)]
    pub total_power: Option<f64>,
}

/// Target operating mode for a set-mode call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatingMode {
    /// Self-consumption driven by the CT meter
    Auto,
    /// Adaptive mode
    Ai,
    /// Schedule-driven; each slot is one write
    Manual(Vec<ScheduleSlot>),
    /// Fixed power target, negative charges
    Passive {
        power: i32,
        countdown: Option<Duration>,
    },
}

impl OperatingMode {
    pub fn name(&self) -> ModeName {
        match self {
            OperatingMode::Auto => ModeName::Auto,
            OperatingMode::Ai => ModeName::Ai,
            OperatingMode::Manual(_) => ModeName::Manual,
            OperatingMode::Passive { .. } => ModeName::Passive,
        }
    }

    /// Check every slot carried by a Manual mode
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let OperatingMode::Manual(slots) = self {
            for slot in slots {
                slot.validate()?;
            }
        }
        Ok(())
    }

    /// Build the `config` objects to send, one per `ES.SetMode` call
    ///
    /// Manual mode yields one config per slot (or a bare mode switch when
    /// there are none); every other mode yields exactly one.
    pub fn configs(&self) -> Result<Vec<ModeConfig>, ValidationError> {
        let configs = match self {
            OperatingMode::Auto => vec![ModeConfig {
                auto_cfg: Some(EnableFlag::ON),
                ..ModeConfig::bare(ModeName::Auto)
            }],
            OperatingMode::Ai => vec![ModeConfig {
                ai_cfg: Some(EnableFlag::ON),
                ..ModeConfig::bare(ModeName::Ai)
            }],
            OperatingMode::Manual(slots) if slots.is_empty() => {
                vec![ModeConfig::bare(ModeName::Manual)]
            }
            OperatingMode::Manual(slots) => slots
                .iter()
                .map(ModeConfig::manual)
                .collect::<Result<Vec<_>, _>>()?,
            OperatingMode::Passive { power, countdown } => vec![ModeConfig {
                passive_cfg: Some(PassiveConfig {
                    power: *power,
                    cd_time: countdown.map(|d| d.as_secs()).unwrap_or(0),
                }),
                ..ModeConfig::bare(ModeName::Passive)
            }],
        };
        Ok(configs)
    }
}

/// `config` object of an `ES.SetMode` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub mode: ModeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_cfg: Option<EnableFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_cfg: Option<EnableFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_cfg: Option<ManualConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive_cfg: Option<PassiveConfig>,
}

impl ModeConfig {
    /// Mode switch without a sub-config
    pub fn bare(mode: ModeName) -> Self {
        Self {
            mode,
            auto_cfg: None,
            ai_cfg: None,
            manual_cfg: None,
            passive_cfg: None,
        }
    }

    /// Single Manual slot write; fails if the slot is invalid
    pub fn manual(slot: &ScheduleSlot) -> Result<Self, ValidationError> {
        Ok(Self {
            manual_cfg: Some(slot.to_manual_config()?),
            ..Self::bare(ModeName::Manual)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableFlag {
    pub enable: u8,
}

impl EnableFlag {
    pub const ON: Self = Self { enable: 1 };
}

/// `passive_cfg` object; `cd_time` 0 means no countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveConfig {
    pub power: i32,
    pub cd_time: u64,
}

/// Result of `ES.SetMode`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetModeResult {
    #[serde(default)]
    pub set_result: bool,
}
