//! Read-only status payloads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::flag;

/// Status categories the device can report on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Wifi,
    Battery,
    EnergySystem,
}

impl StatusKind {
    pub const ALL: [StatusKind; 3] = [
        StatusKind::Wifi,
        StatusKind::Battery,
        StatusKind::EnergySystem,
    ];
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Wifi => f.write_str("wifi"),
            StatusKind::Battery => f.write_str("battery"),
            StatusKind::EnergySystem => f.write_str("es"),
        }
    }
}

impl FromStr for StatusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wifi" => Ok(StatusKind::Wifi),
            "battery" | "bat" => Ok(StatusKind::Battery),
            "es" | "energy" | "energy-system" => Ok(StatusKind::EnergySystem),
            other => Err(format!(
                "Unknown status kind '{}' (expected wifi, battery or es)",
                other
            )),
        }
    }
}

/// Result of `Wifi.GetStatus`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiStatus {
    #[serde(default)]
    pub ssid: Option<String>,
    /// Signal strength in dBm
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub sta_ip: Option<String>,
    #[serde(default)]
    pub sta_gate: Option<String>,
    #[serde(default)]
    pub sta_mask: Option<String>,
    #[serde(default)]
    pub sta_dns: Option<String>,
}

/// Result of `Bat.GetStatus`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// State of charge, percent
    #[serde(default)]
    pub soc: Option<f64>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub charg_flag: Option<bool>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub dischrg_flag: Option<bool>,
    /// Cell temperature, degrees Celsius
    #[serde(default)]
    pub bat_temp: Option<f64>,
    /// Remaining capacity, Wh
    #[serde(default)]
    pub bat_capacity: Option<f64>,
    /// Rated capacity, Wh
    #[serde(default)]
    pub rated_capacity: Option<f64>,
}

/// Result of `ES.GetStatus`
///
/// Power values are in W, energy totals in Wh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySystemStatus {
    #[serde(default)]
    pub bat_soc: Option<f64>,
    #[serde(default)]
    pub bat_cap: Option<f64>,
    #[serde(default)]
    pub pv_power: Option<f64>,
    #[serde(default)]
    pub ongrid_power: Option<f64>,
    #[serde(default)]
    pub offgrid_power: Option<f64>,
    #[serde(default)]
    pub bat_power: Option<f64>,
    #[serde(default)]
    pub total_pv_energy: Option<f64>,
    #[serde(default)]
    pub total_grid_output_energy: Option<f64>,
    #[serde(default)]
    pub total_grid_input_energy: Option<f64>,
    #[serde(default)]
    pub total_load_energy: Option<f64>,
}

/// A typed status reply, one variant per [`StatusKind`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusReport {
    Wifi(WifiStatus),
    Battery(BatteryStatus),
    EnergySystem(EnergySystemStatus),
}

impl StatusReport {
    pub fn kind(&self) -> StatusKind {
        match self {
            StatusReport::Wifi(_) => StatusKind::Wifi,
            StatusReport::Battery(_) => StatusKind::Battery,
            StatusReport::EnergySystem(_) => StatusKind::EnergySystem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_kind_parse() {
        assert_eq!("wifi".parse::<StatusKind>(), Ok(StatusKind::Wifi));
        assert_eq!("BAT".parse::<StatusKind>(), Ok(StatusKind::Battery));
        assert_eq!("es".parse::<StatusKind>(), Ok(StatusKind::EnergySystem));
        assert!("grid".parse::<StatusKind>().is_err());

        for kind in StatusKind::ALL {
            assert_eq!(kind.to_string().parse::<StatusKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_battery_flags_accept_bool_or_int() {
        let status: BatteryStatus = serde_json::from_str(
            r#"{"soc":98,"charg_flag":1,"dischrg_flag":false,"bat_temp":25.5}"#,
        )
        .unwrap();
        assert_eq!(status.soc, Some(98.0));
        assert_eq!(status.charg_flag, Some(true));
        assert_eq!(status.dischrg_flag, Some(false));
        assert_eq!(status.bat_temp, Some(25.5));
        assert_eq!(status.rated_capacity, None);
    }

    #[test]
    fn test_energy_status_partial_payload() {
        let status: EnergySystemStatus = serde_json::from_str(
            r#"{"bat_soc":55,"pv_power":0,"ongrid_power":-120,"total_pv_energy":1830}"#,
        )
        .unwrap();
        assert_eq!(status.bat_soc, Some(55.0));
        assert_eq!(status.ongrid_power, Some(-120.0));
        assert_eq!(status.bat_power, None);
        assert_eq!(status.total_pv_energy, Some(1830.0));
    }

    #[test]
    fn test_wifi_status_ignores_unknown_fields() {
        let status: WifiStatus = serde_json::from_str(
            r#"{"id":0,"ssid":"home","rssi":-52,"sta_ip":"192.168.0.225","extra":true}"#,
        )
        .unwrap();
        assert_eq!(status.ssid.as_deref(), Some("home"));
        assert_eq!(status.rssi, Some(-52));
        assert_eq!(status.sta_dns, None);
    }

    #[test]
    fn test_report_kind() {
        let report = StatusReport::Battery(BatteryStatus::default());
        assert_eq!(report.kind(), StatusKind::Battery);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "battery");
    }
}
