//! Mode commands - show and switch the operating mode

use std::time::Duration;

use anyhow::{bail, Result};
use venus_udp::{ModeName, OperatingMode, VenusDevice};

use crate::output::{reading, yes_no, OutputContext};

/// Show the current mode with live power and CT meter readings
pub async fn mode(device: &VenusDevice, ctx: &OutputContext) -> Result<()> {
    let mode = device.get_mode().await?;

    let pairs = vec![
        ("Mode", reading(mode.mode, "")),
        ("Battery SOC", reading(mode.bat_soc, "%")),
        ("On-grid power", reading(mode.ongrid_power, "W")),
        ("Off-grid power", reading(mode.offgrid_power, "W")),
        ("CT connected", yes_no(mode.ct_state)),
        ("Phase A power", reading(mode.a_power, "W")),
        ("Phase B power", reading(mode.b_power, "W")),
        ("Phase C power", reading(mode.c_power, "W")),
        ("Total power", reading(mode.total_power, "W")),
    ];

    ctx.print_record(&mode, &pairs);
    Ok(())
}

/// Switch mode
///
/// `manual` only switches the mode; slots are written with the schedule
/// command.
pub async fn set_mode(
    device: &VenusDevice,
    mode: ModeName,
    power: Option<i32>,
    countdown: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    let target = build_mode(mode, power, countdown)?;
    device.set_mode(&target).await?;
    ctx.success(&format!("Mode set to {}", target.name()));
    Ok(())
}

fn build_mode(mode: ModeName, power: Option<i32>, countdown: Option<u64>) -> Result<OperatingMode> {
    if mode != ModeName::Passive && (power.is_some() || countdown.is_some()) {
        bail!("--power and --countdown only apply to passive mode");
    }
    match mode {
        ModeName::Auto => Ok(OperatingMode::Auto),
        ModeName::Ai => Ok(OperatingMode::Ai),
        ModeName::Manual => Ok(OperatingMode::Manual(Vec::new())),
        ModeName::Unknown => bail!("Unknown mode"),
        ModeName::Passive => {
            let Some(power) = power else {
                bail!("Passive mode needs --power");
            };
            Ok(OperatingMode::Passive {
                power,
                countdown: countdown.filter(|s| *s > 0).map(Duration::from_secs),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_passive_needs_power() {
        assert!(build_mode(ModeName::Passive, None, Some(60)).is_err());
        assert_eq!(
            build_mode(ModeName::Passive, Some(-800), Some(600)).unwrap(),
            OperatingMode::Passive {
                power: -800,
                countdown: Some(Duration::from_secs(600)),
            }
        );
        assert_eq!(
            build_mode(ModeName::Passive, Some(300), Some(0)).unwrap(),
            OperatingMode::Passive {
                power: 300,
                countdown: None,
            }
        );
    }

    #[test]
    fn test_power_rejected_outside_passive() {
        assert!(build_mode(ModeName::Auto, Some(300), None).is_err());
        assert_eq!(build_mode(ModeName::Ai, None, None).unwrap(), OperatingMode::Ai);
    }

    #[test]
    fn test_mode_names_from_command_line() {
        let mode: ModeName = "AI".parse().unwrap();
        assert_eq!(build_mode(mode, None, None).unwrap(), OperatingMode::Ai);

        let manual: ModeName = "manual".parse().unwrap();
        assert_eq!(
            build_mode(manual, None, None).unwrap(),
            OperatingMode::Manual(Vec::new())
        );
        assert!("eco".parse::<ModeName>().is_err());
    }
}
