//! Status command - read one status family

use anyhow::Result;
use venus_udp::{StatusKind, StatusReport, VenusDevice};

use crate::output::{reading, yes_no, OutputContext};

/// Read and print a status family
pub async fn status(device: &VenusDevice, kind: StatusKind, ctx: &OutputContext) -> Result<()> {
    let report = device.get_status(kind).await?;

    let pairs = match &report {
        StatusReport::Wifi(s) => vec![
            ("SSID", reading(s.ssid.as_deref(), "")),
            ("RSSI", reading(s.rssi, "dBm")),
            ("IP", reading(s.sta_ip.as_deref(), "")),
            ("Gateway", reading(s.sta_gate.as_deref(), "")),
            ("Netmask", reading(s.sta_mask.as_deref(), "")),
            ("DNS", reading(s.sta_dns.as_deref(), "")),
        ],
        StatusReport::Battery(s) => vec![
            ("State of charge", reading(s.soc, "%")),
            ("Charging allowed", yes_no(s.charg_flag)),
            ("Discharging allowed", yes_no(s.dischrg_flag)),
            ("Temperature", reading(s.bat_temp, "°C")),
            ("Remaining capacity", reading(s.bat_capacity, "Wh")),
            ("Rated capacity", reading(s.rated_capacity, "Wh")),
        ],
        StatusReport::EnergySystem(s) => vec![
            ("Battery SOC", reading(s.bat_soc, "%")),
            ("Battery capacity", reading(s.bat_cap, "Wh")),
            ("PV power", reading(s.pv_power, "W")),
            ("On-grid power", reading(s.ongrid_power, "W")),
            ("Off-grid power", reading(s.offgrid_power, "W")),
            ("Battery power", reading(s.bat_power, "W")),
            ("PV energy total", reading(s.total_pv_energy, "Wh")),
            ("Grid export total", reading(s.total_grid_output_energy, "Wh")),
            ("Grid import total", reading(s.total_grid_input_energy, "Wh")),
            ("Load energy total", reading(s.total_load_energy, "Wh")),
        ],
    };

    ctx.print_record(&report, &pairs);
    Ok(())
}
