//! Configuration file handling for venus-cli

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use venus_udp::config::{DeviceConfig, MockConfig};
use venus_udp::{ClientConfig, TransportConfig};

use crate::output::OutputFormat;

/// Configuration for the CLI tool
///
/// Client settings (`[transport]`, `[rpc]`, `[discovery]`, `[device]`) sit at
/// the top level of the file next to the CLI's own keys.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default output format
    pub output: Option<OutputFormat>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Parsed from the same document by [`ClientConfig::from_toml_str`]
    #[serde(skip)]
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse the CLI keys and the client sections of one TOML document
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.client = ClientConfig::from_toml_str(content)?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("venus-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        device: Option<IpAddr>,
        ble_mac: Option<&str>,
        mock: bool,
        output: Option<OutputFormat>,
        no_color: bool,
    ) -> MergedConfig {
        let mut client = self.client.clone();

        if device.is_some() || ble_mac.is_some() {
            let configured = client.device.take().unwrap_or_default();
            client.device = Some(DeviceConfig {
                ip: device.or(if ble_mac.is_some() { None } else { configured.ip }),
                ble_mac: ble_mac.map(String::from).or(configured.ble_mac),
            });
        }

        if mock && !matches!(client.transport, TransportConfig::Mock(_)) {
            client.transport = TransportConfig::Mock(MockConfig::default());
        }

        MergedConfig {
            client,
            output: output.or(self.output).unwrap_or_default(),
            no_color: no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub client: ClientConfig,
    pub output: OutputFormat,
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FILE: &str = r#"
output = "json"

[rpc]
attempt_timeout_ms = 5000

[device]
ip = "192.168.0.225"
"#;

    #[test]
    fn test_parse_cli_and_client_keys() {
        let config = Config::parse(FILE).unwrap();
        assert_eq!(config.output, Some(OutputFormat::Json));
        assert_eq!(config.client.rpc.attempt_timeout_ms, 5000);
        assert_eq!(config.client.rpc.max_attempts, 2);
        assert_eq!(
            config.client.device.unwrap().ip,
            Some("192.168.0.225".parse().unwrap())
        );
    }

    #[test]
    fn test_args_override_file() {
        let config = Config::parse(FILE).unwrap();
        let merged = config.merge_with_args(
            Some("10.0.0.7".parse().unwrap()),
            None,
            false,
            Some(OutputFormat::Table),
            false,
        );
        assert_eq!(merged.output, OutputFormat::Table);
        assert_eq!(
            merged.client.device.unwrap().ip,
            Some("10.0.0.7".parse().unwrap())
        );
    }

    #[test]
    fn test_ble_mac_arg_drops_configured_address() {
        let config = Config::parse(FILE).unwrap();
        let merged = config.merge_with_args(None, Some("18cedfe4f39f"), false, None, false);
        let device = merged.client.device.unwrap();
        assert_eq!(device.ip, None);
        assert_eq!(device.ble_mac.as_deref(), Some("18cedfe4f39f"));
        assert_eq!(merged.output, OutputFormat::Json);
    }

    #[test]
    fn test_mock_flag_selects_mock_transport() {
        let merged = Config::default().merge_with_args(None, None, true, None, true);
        assert!(matches!(merged.client.transport, TransportConfig::Mock(_)));
        assert!(merged.no_color);
        assert_eq!(merged.output, OutputFormat::Table);
    }
}
