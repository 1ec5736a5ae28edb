//! Operations on one device

use std::net::IpAddr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};
use venus_core::{
    BatteryStatus, DeviceDescriptor, DeviceInfo, EnergySystemMode, EnergySystemStatus,
    ModeConfig, OperatingMode, ScheduleSlot, SetModeResult, StatusKind, StatusReport, WifiStatus,
    SLOT_COUNT,
};

use crate::error::ClientError;
use crate::rpc::methods::{self, Method};
use crate::rpc::RpcEndpoint;

/// Where to send unicast calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub ip: IpAddr,
    /// Identity token, used to filter `Marstek.GetDevice`
    pub ble_mac: Option<String>,
}

impl DeviceTarget {
    pub fn new(ip: IpAddr) -> Self {
        Self { ip, ble_mac: None }
    }

    pub fn with_ble_mac(mut self, ble_mac: impl Into<String>) -> Self {
        self.ble_mac = Some(ble_mac.into());
        self
    }
}

impl From<&DeviceDescriptor> for DeviceTarget {
    fn from(device: &DeviceDescriptor) -> Self {
        Self {
            ip: device.ip,
            ble_mac: Some(device.ble_mac.clone()),
        }
    }
}

/// A slot write that failed during clear-all
#[derive(Debug, Serialize)]
pub struct SlotFailure {
    pub index: u8,
    #[serde(serialize_with = "error_message")]
    pub error: ClientError,
}

/// Tally of a clear-all run
#[derive(Debug, Default, Serialize)]
pub struct ClearReport {
    pub attempted: u8,
    pub succeeded: u8,
    pub failed: Vec<SlotFailure>,
}

impl ClearReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.succeeded == self.attempted
    }
}

/// Handle for calls to a single device
///
/// Holds no device state. In particular it never remembers schedule slots:
/// the device cannot report them back, so there is nothing to cache.
#[derive(Clone)]
pub struct VenusDevice {
    endpoint: Arc<RpcEndpoint>,
    target: DeviceTarget,
}

impl VenusDevice {
    pub(crate) fn new(endpoint: Arc<RpcEndpoint>, target: DeviceTarget) -> Self {
        Self { endpoint, target }
    }

    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    async fn invoke<T: DeserializeOwned>(&self, method: Method) -> Result<T, ClientError> {
        let name = method.name();
        let result = self
            .endpoint
            .call(self.target.ip, name, method.params())
            .await?;
        serde_json::from_value(result).map_err(|e| ClientError::InvalidResponse {
            method: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// `Marstek.GetDevice`, unicast
    pub async fn get_device_info(&self) -> Result<DeviceInfo, ClientError> {
        let ble_mac = self
            .target
            .ble_mac
            .clone()
            .unwrap_or_else(|| methods::ANY_DEVICE.to_string());
        self.invoke(Method::GetDevice { ble_mac }).await
    }

    /// One read-only status family
    pub async fn get_status(&self, kind: StatusKind) -> Result<StatusReport, ClientError> {
        let report = match kind {
            StatusKind::Wifi => StatusReport::Wifi(self.get_wifi_status().await?),
            StatusKind::Battery => StatusReport::Battery(self.get_battery_status().await?),
            StatusKind::EnergySystem => {
                StatusReport::EnergySystem(self.get_energy_status().await?)
            }
        };
        Ok(report)
    }

    pub async fn get_wifi_status(&self) -> Result<WifiStatus, ClientError> {
        self.invoke(Method::GetStatus(StatusKind::Wifi)).await
    }

    pub async fn get_battery_status(&self) -> Result<BatteryStatus, ClientError> {
        self.invoke(Method::GetStatus(StatusKind::Battery)).await
    }

    pub async fn get_energy_status(&self) -> Result<EnergySystemStatus, ClientError> {
        self.invoke(Method::GetStatus(StatusKind::EnergySystem))
            .await
    }

    /// Current mode and live power figures
    pub async fn get_mode(&self) -> Result<EnergySystemMode, ClientError> {
        self.invoke(Method::GetMode).await
    }

    /// Switch mode
    ///
    /// Manual slots are all validated before the first write; they are then
    /// written one at a time, stopping at the first failure.
    pub async fn set_mode(&self, mode: &OperatingMode) -> Result<(), ClientError> {
        mode.validate()?;
        let configs = mode.configs()?;

        match mode {
            OperatingMode::Manual(slots) if !slots.is_empty() => {
                for (slot, config) in slots.iter().zip(&configs) {
                    self.apply(config)
                        .await
                        .map_err(|e| ClientError::SlotWrite {
                            index: slot.index,
                            source: Box::new(e),
                        })?;
                }
            }
            _ => {
                for config in &configs {
                    self.apply(config).await?;
                }
            }
        }

        info!(ip = %self.target.ip, mode = %mode.name(), "Mode set");
        Ok(())
    }

    /// Write a single Manual schedule slot
    ///
    /// An invalid slot is rejected before anything is sent.
    pub async fn set_schedule_slot(&self, slot: &ScheduleSlot) -> Result<(), ClientError> {
        let config = ModeConfig::manual(slot)?;
        self.apply(&config).await?;
        debug!(index = slot.index, enabled = slot.enabled, "Schedule slot written");
        Ok(())
    }

    /// Disable every slot, continuing past individual failures
    pub async fn clear_all_schedule_slots(&self) -> ClearReport {
        let mut report = ClearReport::default();
        for index in 0..SLOT_COUNT {
            report.attempted += 1;
            let slot = ScheduleSlot::disabled(index);
            match self.set_schedule_slot(&slot).await {
                Ok(()) => report.succeeded += 1,
                Err(error) => {
                    warn!(index, %error, "Failed to clear schedule slot");
                    report.failed.push(SlotFailure { index, error });
                }
            }
        }
        info!(
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Schedule slots cleared"
        );
        report
    }

    async fn apply(&self, config: &ModeConfig) -> Result<(), ClientError> {
        let result: SetModeResult = self.invoke(Method::SetMode(config.clone())).await?;
        if !result.set_result {
            return Err(ClientError::NotApplied {
                method: methods::ES_SET_MODE.to_string(),
            });
        }
        Ok(())
    }
}

fn error_message<S: Serializer>(error: &ClientError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}
