//! Discover command - find devices on the local network

use std::time::Duration;

use anyhow::{Context, Result};
use venus_udp::VenusClient;

use crate::output::{DeviceRow, OutputContext};

/// Broadcast probes for the whole window and list every device that answered
pub async fn discover(
    client: &VenusClient,
    window: Option<Duration>,
    ctx: &OutputContext,
) -> Result<()> {
    let window = window.unwrap_or_else(|| client.config().discovery.window());
    let spinner = ctx.spinner(&format!("Discovering devices ({}s)...", window.as_secs()));
    let result = client.discover(Some(window)).await;
    spinner.finish_and_clear();
    let devices = result.context("Discovery failed")?;

    if devices.is_empty() {
        ctx.warn("No devices found");
    }

    let rows: Vec<DeviceRow> = devices
        .into_iter()
        .map(|d| DeviceRow {
            ble_mac: d.ble_mac,
            ip: d.ip.to_string(),
            device_type: d.device_type,
            firmware: d.firmware_version,
            wifi_mac: d.wifi_mac,
            ssid: d.ssid,
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
