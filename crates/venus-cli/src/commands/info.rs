//! Info command - show device identity

use anyhow::Result;
use venus_udp::VenusDevice;

use crate::output::OutputContext;

/// Show identity and firmware of the selected device
pub async fn info(device: &VenusDevice, ctx: &OutputContext) -> Result<()> {
    let info = device.get_device_info().await?;

    let pairs = vec![
        ("Type", info.device.clone()),
        ("Firmware", info.ver.to_string()),
        ("BLE MAC", info.ble_mac.clone()),
        ("WiFi MAC", info.wifi_mac.clone()),
        ("SSID", info.wifi_name.clone()),
        (
            "IP",
            info.ip
                .clone()
                .unwrap_or_else(|| device.target().ip.to_string()),
        ),
    ];

    ctx.print_record(&info, &pairs);
    Ok(())
}
