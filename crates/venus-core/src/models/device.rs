//! Device identity models

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Result of `Marstek.GetDevice`, as the device reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device type name (e.g. "VenusE")
    #[serde(default)]
    pub device: String,
    /// Firmware version
    #[serde(default)]
    pub ver: u32,
    /// Bluetooth MAC, the stable identity token
    #[serde(default)]
    pub ble_mac: String,
    /// WiFi MAC
    #[serde(default)]
    pub wifi_mac: String,
    /// SSID the device is joined to
    #[serde(default)]
    pub wifi_name: String,
    /// Current IP address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// A device found on the local network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device type name
    pub device_type: String,
    /// Firmware version
    pub firmware_version: u32,
    /// Identity token used to address the device after discovery
    pub ble_mac: String,
    /// Secondary hardware identity
    pub wifi_mac: String,
    /// Network SSID
    pub ssid: String,
    /// Address the device was last seen at
    pub ip: IpAddr,
}

impl DeviceDescriptor {
    /// Build a descriptor from a discovery reply
    ///
    /// Returns `None` when the reply carries no identity token. When the reply
    /// has no usable `ip` field the datagram's source address is used instead.
    pub fn from_info(info: DeviceInfo, observed_from: IpAddr) -> Option<Self> {
        let ble_mac = info.ble_mac.trim();
        if ble_mac.is_empty() {
            return None;
        }

        let ip = info
            .ip
            .as_deref()
            .and_then(|ip| ip.trim().parse().ok())
            .unwrap_or(observed_from);

        Some(Self {
            device_type: info.device,
            firmware_version: info.ver,
            ble_mac: ble_mac.to_string(),
            wifi_mac: info.wifi_mac,
            ssid: info.wifi_name,
            ip,
        })
    }

    /// Stable identity key
    pub fn identity(&self) -> &str {
        &self.ble_mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info(ble_mac: &str, ip: Option<&str>) -> DeviceInfo {
        DeviceInfo {
            device: "VenusE".into(),
            ver: 111,
            ble_mac: ble_mac.into(),
            wifi_mac: "7483c2315cf8".into(),
            wifi_name: "home".into(),
            ip: ip.map(String::from),
        }
    }

    #[test]
    fn test_descriptor_from_reply() {
        let observed: IpAddr = "192.168.0.1".parse().unwrap();
        let d = DeviceDescriptor::from_info(info("18cedfe4f39f", Some("192.168.0.225")), observed)
            .unwrap();

        assert_eq!(d.identity(), "18cedfe4f39f");
        assert_eq!(d.ip, "192.168.0.225".parse::<IpAddr>().unwrap());
        assert_eq!(d.device_type, "VenusE");
        assert_eq!(d.firmware_version, 111);
        assert_eq!(d.ssid, "home");
    }

    #[test]
    fn test_descriptor_falls_back_to_source_ip() {
        let observed: IpAddr = "10.0.0.7".parse().unwrap();
        let d = DeviceDescriptor::from_info(info("abc", None), observed).unwrap();
        assert_eq!(d.ip, observed);

        let d = DeviceDescriptor::from_info(info("abc", Some("not-an-ip")), observed).unwrap();
        assert_eq!(d.ip, observed);
    }

    #[test]
    fn test_descriptor_requires_identity() {
        let observed: IpAddr = "10.0.0.7".parse().unwrap();
        assert!(DeviceDescriptor::from_info(info("", Some("10.0.0.7")), observed).is_none());
        assert!(DeviceDescriptor::from_info(info("  ", None), observed).is_none());
    }

    #[test]
    fn test_device_info_tolerates_missing_fields() {
        let info: DeviceInfo =
            serde_json::from_str(r#"{"device":"VenusE","ble_mac":"18cedfe4f39f"}"#).unwrap();
        assert_eq!(info.ver, 0);
        assert_eq!(info.ip, None);
    }
}
