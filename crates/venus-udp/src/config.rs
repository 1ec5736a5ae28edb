//! Client configuration
//!
//! Timing defaults reflect how the device behaves in practice: it drops or
//! delays a fair share of datagrams, so calls are retried and discovery keeps
//! probing for the whole window.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known port the device listens and replies on
pub const DEVICE_PORT: u16 = 30000;

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,
    /// Unicast call policy
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Discovery policy
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Fixed device to talk to, skipping discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceConfig>,
}

impl ClientConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Real UDP socket on the device port
    Udp(UdpConfig),
    /// In-memory transport with a simulated device
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Udp(UdpConfig::default())
    }
}

/// UDP socket configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpConfig {
    /// Local address to bind
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,
    /// Local port; the device only answers broadcasts on its own port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

fn default_bind_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    DEVICE_PORT
}

/// Mock transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Loop broadcast sends back to the receiver, as some network stacks do
    #[serde(default)]
    pub echo_broadcasts: bool,
    /// Address of the simulated device
    #[serde(default = "default_mock_device_ip")]
    pub device_ip: IpAddr,
    /// Identity token of the simulated device
    #[serde(default = "default_mock_ble_mac")]
    pub ble_mac: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            echo_broadcasts: false,
            device_ip: default_mock_device_ip(),
            ble_mac: default_mock_ble_mac(),
        }
    }
}

fn default_mock_device_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 168, 0, 225))
}

fn default_mock_ble_mac() -> String {
    "18cedfe4f39f".to_string()
}

// =============================================================================
// Call and Discovery Policy
// =============================================================================

/// Unicast request policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Time to wait for a reply per attempt
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,
    /// Transmissions per logical call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Port requests are sent to
    #[serde(default = "default_port")]
    pub device_port: u16,
    /// How long the receive loop blocks before re-checking for shutdown
    #[serde(default = "default_receive_poll")]
    pub receive_poll_ms: u64,
}

impl RpcConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn receive_poll(&self) -> Duration {
        Duration::from_millis(self.receive_poll_ms.max(1))
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: default_attempt_timeout(),
            max_attempts: default_max_attempts(),
            device_port: default_port(),
            receive_poll_ms: default_receive_poll(),
        }
    }
}

fn default_attempt_timeout() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    2
}

fn default_receive_poll() -> u64 {
    1000
}

/// Broadcast discovery policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Total listening window
    #[serde(default = "default_window")]
    pub window_ms: u64,
    /// Interval between repeated probes
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,
    /// Per-read timeout while collecting replies
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Broadcast destination
    #[serde(default = "default_broadcast_addr")]
    pub broadcast_addr: IpAddr,
    /// Destination port for probes
    #[serde(default = "default_port")]
    pub port: u16,
}

impl DiscoveryConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(1))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window(),
            probe_interval_ms: default_probe_interval(),
            read_timeout_ms: default_read_timeout(),
            broadcast_addr: default_broadcast_addr(),
            port: default_port(),
        }
    }
}

fn default_window() -> u64 {
    15_000
}

fn default_probe_interval() -> u64 {
    2000
}

fn default_read_timeout() -> u64 {
    1000
}

fn default_broadcast_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::BROADCAST)
}

/// A device addressed directly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ble_mac: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.rpc.attempt_timeout(), Duration::from_secs(10));
        assert_eq!(config.rpc.max_attempts, 2);
        assert_eq!(config.discovery.window(), Duration::from_secs(15));
        assert_eq!(config.discovery.probe_interval(), Duration::from_secs(2));
        assert_eq!(config.discovery.read_timeout(), Duration::from_secs(1));
        assert!(matches!(config.transport, TransportConfig::Udp(ref u) if u.port == 30000));
    }

    #[test]
    fn test_parse_mock_transport() {
        let config = ClientConfig::from_toml_str(
            r#"
            [transport]
            type = "mock"
            latency_ms = 5
            echo_broadcasts = true

            [rpc]
            attempt_timeout_ms = 500
            max_attempts = 3

            [device]
            ip = "192.168.1.40"
            "#,
        )
        .unwrap();

        match config.transport {
            TransportConfig::Mock(m) => {
                assert_eq!(m.latency_ms, 5);
                assert!(m.echo_broadcasts);
                assert_eq!(m.ble_mac, "18cedfe4f39f");
            }
            other => panic!("unexpected transport {:?}", other),
        }
        assert_eq!(config.rpc.max_attempts, 3);
        assert_eq!(config.rpc.device_port, 30000);
        assert_eq!(config.discovery.window_ms, 15_000);
        assert_eq!(
            config.device.unwrap().ip,
            Some("192.168.1.40".parse().unwrap())
        );
    }

    #[test]
    fn test_parse_udp_transport() {
        let config = ClientConfig::from_toml_str(
            r#"
            [transport]
            type = "udp"
            bind_addr = "192.168.1.10"
            "#,
        )
        .unwrap();
        match config.transport {
            TransportConfig::Udp(u) => {
                assert_eq!(u.bind_addr, "192.168.1.10".parse::<IpAddr>().unwrap());
                assert_eq!(u.port, DEVICE_PORT);
            }
            other => panic!("unexpected transport {:?}", other),
        }
    }

    #[test]
    fn test_parse_error() {
        let err = ClientConfig::from_toml_str("[transport]\ntype = \"serial\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
