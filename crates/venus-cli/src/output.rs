//! Output formatting for venus-cli (table, json)

use std::fmt::Display;
use std::time::Duration;

use clap::ValueEnum;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and key/value lists (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet && self.format == OutputFormat::Table {
            println!("{}", msg.green());
        }
    }

    /// Progress note on stderr, kept out of the data stream
    pub fn note(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg.dimmed());
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Spinner shown while waiting on the network
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.quiet || self.format != OutputFormat::Table {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => print_json(&data),
        }
    }

    /// Print one record: key/value lines as a table, the typed value as JSON
    pub fn print_record<T: Serialize>(&self, value: &T, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => print_json(value),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    );
}

/// Render an optional reading with its unit, "-" when the device left it out
pub fn reading<T: Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) if unit.is_empty() => v.to_string(),
        Some(v) => format!("{} {}", v, unit),
        None => "-".to_string(),
    }
}

/// Render an optional flag
pub fn yes_no(value: Option<bool>) -> String {
    match value {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => "-".to_string(),
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Device display for discover command
#[derive(Debug, Tabled, Serialize)]
pub struct DeviceRow {
    #[tabled(rename = "BLE MAC")]
    pub ble_mac: String,
    #[tabled(rename = "IP")]
    pub ip: String,
    #[tabled(rename = "Type")]
    pub device_type: String,
    #[tabled(rename = "Firmware")]
    pub firmware: u32,
    #[tabled(rename = "WiFi MAC")]
    pub wifi_mac: String,
    #[tabled(rename = "SSID")]
    pub ssid: String,
}

/// Failed slot display for clear-schedules command
#[derive(Debug, Tabled, Serialize)]
pub struct SlotFailureRow {
    #[tabled(rename = "Slot")]
    pub index: u8,
    #[tabled(rename = "Error")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading() {
        assert_eq!(reading(Some(64.0), "%"), "64 %");
        assert_eq!(reading(Some(-58), ""), "-58");
        assert_eq!(reading::<f64>(None, "W"), "-");
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no(Some(true)), "Yes");
        assert_eq!(yes_no(None), "-");
    }
}
