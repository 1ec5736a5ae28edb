//! venus-cli - Command-line tool for Venus battery-storage devices
//!
//! Discovers devices on the local network and reads or changes their state
//! over the local UDP API.

mod commands;
mod config;
mod output;

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use venus_udp::{DeviceTarget, ModeName, StatusKind, VenusClient, VenusDevice};

use crate::commands::schedule::SlotArgs;
use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "venus-cli")]
#[command(author, version, about = "Venus battery-storage CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Device IP address (skips discovery)
    #[arg(short, long, env = "VENUS_DEVICE")]
    device: Option<IpAddr>,

    /// Device BLE MAC; located by discovery when no address is given
    #[arg(short, long, env = "VENUS_BLE_MAC")]
    ble_mac: Option<String>,

    /// Use the in-memory simulated device instead of the network
    #[arg(long)]
    mock: bool,

    /// Configuration file path
    #[arg(short, long, env = "VENUS_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find devices on the local network
    Discover {
        /// Listening window in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Show device identity and firmware
    Info,

    /// Read a status family
    Status {
        /// Status family: wifi, battery, es
        #[arg(value_name = "KIND")]
        kind: StatusKind,
    },

    /// Show the current operating mode and live power figures
    Mode,

    /// Switch operating mode
    SetMode {
        /// Mode: auto, ai, manual, passive
        #[arg(value_name = "MODE")]
        mode: ModeName,

        /// Passive target power in W (negative charges)
        #[arg(long, allow_negative_numbers = true)]
        power: Option<i32>,

        /// Passive countdown in seconds (0 or absent = none)
        #[arg(long)]
        countdown: Option<u64>,
    },

    /// Write one Manual schedule slot
    Schedule(SlotArgs),

    /// Disable all ten schedule slots
    ClearSchedules,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    let merged = config.merge_with_args(
        cli.device,
        cli.ble_mac.as_deref(),
        cli.mock,
        cli.output,
        cli.no_color,
    );

    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);

    let client = VenusClient::connect(merged.client.clone())
        .await
        .context("Failed to open UDP socket")?;

    match &cli.command {
        Commands::Discover { timeout } => {
            commands::discover(&client, timeout.map(Duration::from_secs), &ctx).await?;
        }

        Commands::Info => {
            let device = resolve_device(&client, &merged, &ctx).await?;
            commands::info(&device, &ctx).await?;
        }

        Commands::Status { kind } => {
            let device = resolve_device(&client, &merged, &ctx).await?;
            commands::status(&device, *kind, &ctx).await?;
        }

        Commands::Mode => {
            let device = resolve_device(&client, &merged, &ctx).await?;
            commands::mode(&device, &ctx).await?;
        }

        Commands::SetMode {
            mode,
            power,
            countdown,
        } => {
            let device = resolve_device(&client, &merged, &ctx).await?;
            commands::set_mode(&device, *mode, *power, *countdown, &ctx).await?;
        }

        Commands::Schedule(args) => {
            let device = resolve_device(&client, &merged, &ctx).await?;
            commands::schedule(&device, args, &ctx).await?;
        }

        Commands::ClearSchedules => {
            let device = resolve_device(&client, &merged, &ctx).await?;
            commands::clear_schedules(&device, &ctx).await?;
        }
    }

    Ok(())
}

/// Pick the device to talk to
///
/// An explicit address wins. Otherwise the BLE MAC is looked up by discovery,
/// and with neither the first device that answers is used.
async fn resolve_device(
    client: &VenusClient,
    merged: &MergedConfig,
    ctx: &OutputContext,
) -> Result<VenusDevice> {
    let device = merged.client.device.clone().unwrap_or_default();

    if let Some(ip) = device.ip {
        debug!(%ip, "Using configured device address");
        let mut target = DeviceTarget::new(ip);
        if let Some(ble_mac) = device.ble_mac {
            target = target.with_ble_mac(ble_mac);
        }
        return Ok(client.device(target));
    }

    if let Some(ble_mac) = device.ble_mac {
        let spinner = ctx.spinner(&format!("Looking for {}...", ble_mac));
        let found = client.find_device(&ble_mac, None).await;
        spinner.finish_and_clear();
        return match found.context("Discovery failed")? {
            Some(descriptor) => {
                debug!(ble_mac = %descriptor.ble_mac, ip = %descriptor.ip, "Located device");
                Ok(client.device(DeviceTarget::from(&descriptor)))
            }
            None => bail!("Device {} did not answer discovery", ble_mac),
        };
    }

    let spinner = ctx.spinner("Discovering devices...");
    let found = client.discover(None).await;
    spinner.finish_and_clear();
    let Some(first) = found.context("Discovery failed")?.into_iter().next() else {
        bail!("No device found; pass --device or --ble-mac");
    };
    ctx.note(&format!("Using {} at {}", first.ble_mac, first.ip));
    Ok(client.device(DeviceTarget::from(&first)))
}
