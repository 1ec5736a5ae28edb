//! Schedule commands - write and clear Manual-mode slots

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::debug;
use venus_udp::{ScheduleSlot, SlotMode, VenusDevice, Weekdays};

use crate::output::{OutputContext, OutputFormat, SlotFailureRow};

/// Arguments of the schedule command
#[derive(Debug, Args)]
pub struct SlotArgs {
    /// Slot index (0-9)
    #[arg(long)]
    pub slot: u8,

    /// Start time, HH:MM
    #[arg(long)]
    pub start: String,

    /// End time, HH:MM (after start, same day)
    #[arg(long)]
    pub end: String,

    /// Active days: bitmask 1-127 (bit 0 = Monday), "all", "weekdays",
    /// "weekend" or a list such as "mon,wed,fri"
    #[arg(long, default_value = "all")]
    pub days: String,

    /// Charge the battery during the slot
    #[arg(long, conflicts_with = "discharge", required_unless_present = "discharge")]
    pub charge: bool,

    /// Discharge the battery during the slot
    #[arg(long)]
    pub discharge: bool,

    /// Power magnitude in W (100-800)
    #[arg(long)]
    pub power: u16,

    /// Write the slot disabled
    #[arg(long)]
    pub disable: bool,
}

impl SlotArgs {
    fn to_slot(&self) -> Result<ScheduleSlot> {
        let mode = if self.charge {
            SlotMode::Charging
        } else {
            SlotMode::Discharging
        };
        let days = parse_days(&self.days)?;
        let mut slot = ScheduleSlot::new(self.slot, &self.start, &self.end, days, mode, self.power)
            .context("Invalid schedule slot")?;
        slot.enabled = !self.disable;
        Ok(slot)
    }
}

/// Write one schedule slot
pub async fn schedule(device: &VenusDevice, args: &SlotArgs, ctx: &OutputContext) -> Result<()> {
    let slot = args.to_slot()?;
    debug!(?slot, "Writing schedule slot");
    device.set_schedule_slot(&slot).await?;
    ctx.success(&format!(
        "Slot {} written: {}-{} {} {} {} W{}",
        slot.index,
        args.start,
        args.end,
        slot.days,
        slot.mode,
        slot.power,
        if slot.enabled { "" } else { " (disabled)" }
    ));
    Ok(())
}

/// Disable every slot and report the tally
pub async fn clear_schedules(device: &VenusDevice, ctx: &OutputContext) -> Result<()> {
    let spinner = ctx.spinner("Clearing schedule slots...");
    let report = device.clear_all_schedule_slots().await;
    spinner.finish_and_clear();

    if ctx.format == OutputFormat::Json {
        ctx.print_record(&report, &[]);
    } else if report.is_complete() {
        ctx.success(&format!("Cleared {} schedule slots", report.succeeded));
    } else {
        ctx.error(&format!(
            "Cleared {} of {} schedule slots",
            report.succeeded, report.attempted
        ));
        let rows: Vec<SlotFailureRow> = report
            .failed
            .iter()
            .map(|f| SlotFailureRow {
                index: f.index,
                error: f.error.to_string(),
            })
            .collect();
        ctx.print(&rows);
    }

    if !report.is_complete() {
        bail!("{} slot(s) could not be cleared", report.failed.len());
    }
    Ok(())
}

/// Parse an active-days argument into a bitmask
fn parse_days(s: &str) -> Result<Weekdays> {
    let s = s.trim().to_ascii_lowercase();
    if let Ok(bits) = s.parse::<u8>() {
        return Ok(Weekdays::from_bits(bits));
    }
    match s.as_str() {
        "all" | "daily" => return Ok(Weekdays::ALL),
        "weekdays" => return Ok(Weekdays::WEEKDAYS),
        "weekend" => return Ok(Weekdays::WEEKEND),
        _ => {}
    }

    let mut days = Weekdays::from_bits(0);
    for name in s.split(',').map(str::trim) {
        let day = match name {
            "mon" | "monday" => Weekdays::MONDAY,
            "tue" | "tuesday" => Weekdays::TUESDAY,
            "wed" | "wednesday" => Weekdays::WEDNESDAY,
            "thu" | "thursday" => Weekdays::THURSDAY,
            "fri" | "friday" => Weekdays::FRIDAY,
            "sat" | "saturday" => Weekdays::SATURDAY,
            "sun" | "sunday" => Weekdays::SUNDAY,
            other => bail!("Unknown day '{}'", other),
        };
        days = days | day;
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(days: &str) -> SlotArgs {
        SlotArgs {
            slot: 2,
            start: "08:00".into(),
            end: "16:30".into(),
            days: days.into(),
            charge: true,
            discharge: false,
            power: 400,
            disable: false,
        }
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days("127").unwrap(), Weekdays::ALL);
        assert_eq!(parse_days("weekend").unwrap(), Weekdays::WEEKEND);
        assert_eq!(parse_days("Mon, fri").unwrap().bits(), 17);
        assert!(parse_days("mon,someday").is_err());
    }

    #[test]
    fn test_slot_from_args() {
        let slot = args("weekdays").to_slot().unwrap();
        assert_eq!(slot.index, 2);
        assert_eq!(slot.days, Weekdays::WEEKDAYS);
        assert_eq!(slot.signed_power(), -400);
        assert!(slot.enabled);
        assert!(slot.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_days_reach_the_validator() {
        let slot = args("0").to_slot().unwrap();
        assert!(slot.validate().is_err());
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let mut bad = args("all");
        bad.start = "25:00".into();
        assert!(bad.to_slot().is_err());
    }
}
