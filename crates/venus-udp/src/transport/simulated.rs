//! In-process stand-in for a Venus device
//!
//! Answers the same method set as real hardware, enforces the same slot
//! rules on `ES.SetMode` and keeps the current mode in memory. Used as the
//! default responder of [`MockTransport`](super::MockTransport).

use std::net::{IpAddr, SocketAddr};

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::debug;
use venus_core::schedule::{MAX_SLOT_POWER, MIN_SLOT_POWER};
use venus_core::{ManualConfig, ModeConfig, ModeName, SLOT_COUNT};

use crate::config::MockConfig;
use crate::rpc::codec::{self, Decoded, RpcRequest, RpcResponse};
use crate::rpc::methods;

const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Simulated device state
pub struct SimulatedDevice {
    ip: IpAddr,
    port: u16,
    ble_mac: String,
    mode: Mutex<ModeName>,
    applied: Mutex<Vec<ModeConfig>>,
}

impl SimulatedDevice {
    pub fn new(config: &MockConfig, port: u16) -> Self {
        Self {
            ip: config.device_ip,
            port,
            ble_mac: config.ble_mac.clone(),
            mode: Mutex::new(ModeName::Auto),
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    pub fn mode(&self) -> ModeName {
        *self.mode.lock()
    }

    /// Every accepted `ES.SetMode` config, in arrival order
    pub fn applied(&self) -> Vec<ModeConfig> {
        self.applied.lock().clone()
    }

    /// Handle one datagram sent to `dest`; returns the reply, if any
    pub fn respond(&self, data: &[u8], dest: SocketAddr) -> Option<(SocketAddr, Vec<u8>)> {
        let Decoded::Request(request) = codec::decode(data) else {
            return None;
        };

        let is_probe = request.method == methods::GET_DEVICE;
        let addressed = dest.ip() == self.ip || (is_probe && is_broadcast(dest.ip()));
        if !addressed {
            return None;
        }

        let response = self.handle(&request)?;
        debug!(method = %request.method, id = request.id, "Simulated device replied");
        codec::encode_response(&response)
            .ok()
            .map(|bytes| (self.address(), bytes))
    }

    fn handle(&self, request: &RpcRequest) -> Option<RpcResponse> {
        let src = Some(format!("VenusE-{}", self.ble_mac));
        let result = match request.method.as_str() {
            methods::GET_DEVICE => {
                let filter = request
                    .params
                    .get("ble_mac")
                    .and_then(Value::as_str)
                    .unwrap_or(methods::ANY_DEVICE);
                if filter != methods::ANY_DEVICE && filter != self.ble_mac {
                    return None;
                }
                json!({
                    "device": "VenusE",
                    "ver": 111,
                    "ble_mac": self.ble_mac,
                    "wifi_mac": "7483c2315cf8",
                    "wifi_name": "venus-lab",
                    "ip": self.ip.to_string(),
                })
            }
            methods::WIFI_GET_STATUS => json!({
                "id": 0,
                "ssid": "venus-lab",
                "rssi": -58,
                "sta_ip": self.ip.to_string(),
                "sta_gate": "192.168.0.1",
                "sta_mask": "255.255.255.0",
                "sta_dns": "192.168.0.1",
            }),
            methods::BAT_GET_STATUS => json!({
                "id": 0,
                "soc": 64,
                "charg_flag": 1,
                "dischrg_flag": 1,
                "bat_temp": 24.0,
                "bat_capacity": 3277.0,
                "rated_capacity": 5120.0,
            }),
            methods::ES_GET_STATUS => json!({
                "id": 0,
                "bat_soc": 64,
                "bat_cap": 5120,
                "pv_power": 0,
                "ongrid_power": -312,
                "offgrid_power": 0,
                "bat_power": 312,
                "total_pv_energy": 0,
                "total_grid_output_energy": 84210,
                "total_grid_input_energy": 90544,
                "total_load_energy": 0,
            }),
            methods::ES_GET_MODE => json!({
                "id": 0,
                "mode": self.mode().to_string(),
                "ongrid_power": -312,
                "offgrid_power": 0,
                "bat_soc": 64,
                "ct_state": 1,
                "a_power": 120,
                "b_power": 96,
                "c_power": 96,
                "total_power": 312,
            }),
            methods::ES_SET_MODE => return Some(self.set_mode(request)),
            _ => {
                return Some(RpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    "Method not found",
                ))
            }
        };
        Some(RpcResponse::result(request.id, src, result))
    }

    fn set_mode(&self, request: &RpcRequest) -> RpcResponse {
        let config = request
            .params
            .get("config")
            .cloned()
            .and_then(|c| serde_json::from_value::<ModeConfig>(c).ok());
        let Some(config) = config else {
            return RpcResponse::error(request.id, INVALID_PARAMS, "Invalid params");
        };

        let accepted = match (&config.mode, &config.manual_cfg) {
            (ModeName::Unknown, _) => false,
            (ModeName::Manual, Some(slot)) => slot_is_acceptable(slot),
            _ => true,
        };
        if accepted {
            *self.mode.lock() = config.mode;
            self.applied.lock().push(config);
        }

        RpcResponse::result(
            request.id,
            Some(format!("VenusE-{}", self.ble_mac)),
            json!({ "id": 0, "set_result": accepted }),
        )
    }
}

fn slot_is_acceptable(slot: &ManualConfig) -> bool {
    let magnitude = slot.power.unsigned_abs();
    slot.time_num < SLOT_COUNT
        && slot.start_time < slot.end_time
        && (1..=127).contains(&slot.week_set)
        && (u32::from(MIN_SLOT_POWER)..=u32::from(MAX_SLOT_POWER)).contains(&magnitude)
}

fn is_broadcast(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_broadcast() || v4.octets()[3] == 255,
        IpAddr::V6(_) => false,
    }
}
