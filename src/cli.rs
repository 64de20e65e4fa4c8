/*
 * This file is part of Upshat.
 *
 * Copyright (C) 2025 Upshat contributors
 *
 * Upshat is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Upshat is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Upshat. If not, see <https://www.gnu.org/licenses/>.
 */

//! Command Line Interface

use clap::{Args, Parser, Subcommand};

use uh_core::constants::timing;

#[derive(Parser, Debug)]
#[command(name = "upshat")]
#[command(version)]
#[command(about = "Upshat - calibration compensation and UPS hat monitoring")]
#[command(long_about = "Upshat - calibration compensation and UPS hat monitoring

Validates calibration data points, fits correction polynomials and drives
a simulated X1200 UPS hat through its setup and polling cycle.

EXAMPLES:
    upshat validate --degree 1 0,1 1,3 2,5
    upshat fit --degree 2 --value 3.5 0,1 1,2 2,5 3,10
    upshat probe --address 0x36
    upshat poll --count 5 --interval-secs 2
    upshat settings show

ENVIRONMENT VARIABLES:
    RUST_LOG=debug         Enable debug logging
    UPSHAT_CONFIG_DIR      Override the configuration directory

FILES:
    ~/.config/upshat/settings.json   Application settings
    ~/.config/upshat/events.jsonl    Structured event log")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Append structured events to the event log
    #[arg(long, global = true)]
    pub logging: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate calibration data points
    Validate(ValidateArgs),

    /// Fit a compensation polynomial and apply it to raw values
    Fit(FitArgs),

    /// Run device setup and a connection test
    Probe(DeviceArgs),

    /// Read the UPS hat repeatedly
    Poll(PollArgs),

    /// Settings management
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Polynomial degree (0-7)
    #[arg(short, long)]
    pub degree: Option<f64>,

    /// Data points as "measured,true"
    #[arg(required = true, allow_hyphen_values = true)]
    pub points: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FitArgs {
    /// Polynomial degree (0-7)
    #[arg(short, long)]
    pub degree: Option<f64>,

    /// Decimal places in the output
    #[arg(short, long)]
    pub precision: Option<f64>,

    /// Clamp output to the smallest calibrated true value
    #[arg(long)]
    pub lower_limit: bool,

    /// Clamp output to the largest calibrated true value
    #[arg(long)]
    pub upper_limit: bool,

    /// Raw value to compensate (repeatable)
    #[arg(long = "value", allow_negative_numbers = true)]
    pub values: Vec<f64>,

    /// Data points as "measured,true"
    #[arg(required = true, allow_hyphen_values = true)]
    pub points: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct DeviceArgs {
    /// I2C bus number (defaults to the settings file)
    #[arg(long)]
    pub bus: Option<u8>,

    /// Hex device address (defaults to the settings file)
    #[arg(long)]
    pub address: Option<String>,

    /// Simulate a bus fault
    #[arg(long)]
    pub fault: bool,
}

#[derive(Args, Debug)]
pub struct PollArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// Number of reads
    #[arg(short, long, default_value_t = timing::CLI_POLL_COUNT)]
    pub count: u32,

    /// Seconds between reads
    #[arg(short, long, default_value_t = timing::CLI_POLL_DELAY_SECS)]
    pub interval_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show all settings as JSON
    Show,

    /// Print the settings file path
    Path,

    /// Write default settings to disk
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}
