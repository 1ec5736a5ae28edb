//! The closed set of device methods

use serde_json::{json, Value};
use venus_core::{ModeConfig, StatusKind};

use super::codec::{RpcRequest, DISCOVERY_REQUEST_ID};

pub const GET_DEVICE: &str = "Marstek.GetDevice";
pub const WIFI_GET_STATUS: &str = "Wifi.GetStatus";
pub const BAT_GET_STATUS: &str = "Bat.GetStatus";
pub const ES_GET_STATUS: &str = "ES.GetStatus";
pub const ES_GET_MODE: &str = "ES.GetMode";
pub const ES_SET_MODE: &str = "ES.SetMode";

/// Identity filter that makes every device answer a probe
pub const ANY_DEVICE: &str = "0";

/// Index of the energy system inside the device; single-unit devices use 0
const SYSTEM_INDEX: u32 = 0;

/// A typed device call
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// Identity lookup, filtered by identity token (`"0"` for any)
    GetDevice { ble_mac: String },
    /// One of the read-only status families
    GetStatus(StatusKind),
    /// Current mode plus live power figures
    GetMode,
    /// Mode switch or single Manual slot write
    SetMode(ModeConfig),
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::GetDevice { .. } => GET_DEVICE,
            Method::GetStatus(kind) => status_method(*kind),
            Method::GetMode => ES_GET_MODE,
            Method::SetMode(_) => ES_SET_MODE,
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Method::GetDevice { ble_mac } => json!({ "ble_mac": ble_mac }),
            Method::GetStatus(_) | Method::GetMode => json!({ "id": SYSTEM_INDEX }),
            Method::SetMode(config) => json!({ "id": SYSTEM_INDEX, "config": config }),
        }
    }
}

/// Method name for a status family
pub fn status_method(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Wifi => WIFI_GET_STATUS,
        StatusKind::Battery => BAT_GET_STATUS,
        StatusKind::EnergySystem => ES_GET_STATUS,
    }
}

/// Broadcast probe, optionally restricted to one identity token
pub fn discovery_probe(ble_mac: Option<&str>) -> RpcRequest {
    let method = Method::GetDevice {
        ble_mac: ble_mac.unwrap_or(ANY_DEVICE).to_string(),
    };
    RpcRequest::new(DISCOVERY_REQUEST_ID, method.name(), method.params())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use venus_core::{ModeName, OperatingMode};

    #[test]
    fn test_probe_shape() {
        let probe = discovery_probe(None);
        assert_eq!(
            serde_json::to_value(&probe).unwrap(),
            json!({"id": 0, "method": "Marstek.GetDevice", "params": {"ble_mac": "0"}})
        );

        let targeted = discovery_probe(Some("18cedfe4f39f"));
        assert_eq!(targeted.params, json!({"ble_mac": "18cedfe4f39f"}));
    }

    #[test]
    fn test_status_methods() {
        assert_eq!(Method::GetStatus(StatusKind::Wifi).name(), "Wifi.GetStatus");
        assert_eq!(Method::GetStatus(StatusKind::Battery).name(), "Bat.GetStatus");
        assert_eq!(
            Method::GetStatus(StatusKind::EnergySystem).name(),
            "ES.GetStatus"
        );
        assert_eq!(Method::GetMode.params(), json!({"id": 0}));
    }

    #[test]
    fn test_set_mode_params() {
        let configs = OperatingMode::Auto.configs().unwrap();
        let method = Method::SetMode(configs[0].clone());
        assert_eq!(
            method.params(),
            json!({"id": 0, "config": {"mode": "Auto", "auto_cfg": {"enable": 1}}})
        );

        let bare = Method::SetMode(ModeConfig::bare(ModeName::Manual));
        assert_eq!(bare.params(), json!({"id": 0, "config": {"mode": "Manual"}}));
    }
}
