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

//! Command handlers
//!
//! Each handler writes its human-readable output to `out` and returns an
//! error for a non-zero exit. Validation failures also print the form error
//! map so scripts can match on the message key.

use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, warn};

use uh_core::settings::{self, AppSettings, DeviceSettings};
use uh_core::{
    form_errors, setup_device, validate_options, Compensation, OptionsInput, UpsHat,
    UpsHatError, X1200Mock,
};

use crate::cli::{Commands, DeviceArgs, FitArgs, PollArgs, SettingsCommands, ValidateArgs};
use crate::logger::log_event;

pub fn execute(cmd: &Commands, settings: &AppSettings, out: &mut dyn Write) -> Result<()> {
    match cmd {
        Commands::Validate(args) => cmd_validate(args, settings, out),
        Commands::Fit(args) => cmd_fit(args, settings, out),
        Commands::Probe(args) => cmd_probe(args, settings, out),
        Commands::Poll(args) => cmd_poll(args, settings, out),
        Commands::Settings(sub) => cmd_settings(sub, out),
    }
}

/// Print the form error map, log it and hand the error back
fn report(out: &mut dyn Write, event: &str, err: UpsHatError) -> anyhow::Error {
    let errors = form_errors(&err);
    log_event(event, json!({ "errors": errors, "message": err.to_string() }));
    if let Ok(line) = serde_json::to_string(&errors) {
        let _ = writeln!(out, "{}", line);
    }
    anyhow::Error::new(err)
}

fn options_input(
    points: &[String],
    degree: Option<f64>,
    precision: Option<f64>,
    settings: &AppSettings,
) -> OptionsInput {
    let mut input = OptionsInput::new(points.iter().cloned());
    input.degree = degree.unwrap_or_else(|| f64::from(settings.calibration.degree));
    input.precision = precision.unwrap_or_else(|| f64::from(settings.calibration.precision));
    input
}

// ============================================================================
// Calibration Commands
// ============================================================================

fn cmd_validate(args: &ValidateArgs, settings: &AppSettings, out: &mut dyn Write) -> Result<()> {
    let input = options_input(&args.points, args.degree, None, settings);
    let options = validate_options(&input).map_err(|e| report(out, "validate_failed", e))?;

    log_event(
        "validate_ok",
        json!({ "points": options.calibration.len(), "degree": options.degree() }),
    );
    writeln!(
        out,
        "OK: {} data points for degree {}",
        options.calibration.len(),
        options.degree()
    )?;
    Ok(())
}

fn cmd_fit(args: &FitArgs, settings: &AppSettings, out: &mut dyn Write) -> Result<()> {
    let mut input = options_input(&args.points, args.degree, args.precision, settings);
    input.lower_limit = args.lower_limit;
    input.upper_limit = args.upper_limit;

    let options = validate_options(&input).map_err(|e| report(out, "fit_failed", e))?;
    let compensation = Compensation::new(&options.calibration, options.settings())
        .map_err(|e| report(out, "fit_failed", e))?;

    let coefficients = compensation.polynomial().coefficients();
    log_event(
        "fit_ok",
        json!({ "degree": options.degree(), "coefficients": coefficients }),
    );

    writeln!(out, "coefficients: {:?}", coefficients)?;
    let decimals = options.precision as usize;
    for raw in &args.values {
        writeln!(out, "{} -> {:.*}", raw, decimals, compensation.apply(*raw))?;
    }
    Ok(())
}

// ============================================================================
// Device Commands
// ============================================================================

/// Settings-file device with command-line overrides applied
fn device_settings(args: &DeviceArgs, settings: &AppSettings) -> DeviceSettings {
    let mut device = settings.device.clone();
    if let Some(bus) = args.bus {
        device.bus = bus;
    }
    if let Some(address) = &args.address {
        device.address = address.clone();
    }
    device.simulate_fault |= args.fault;
    device
}

fn cmd_probe(args: &DeviceArgs, settings: &AppSettings, out: &mut dyn Write) -> Result<()> {
    let device = device_settings(args, settings);
    let config = device
        .to_device_config()
        .map_err(|e| report(out, "probe_failed", e))?;

    let entry = setup_device(&device.to_device_input(), |_| X1200Mock::new(&config))
        .map_err(|e| report(out, "probe_failed", e))?;

    log_event(
        "probe_ok",
        json!({ "bus": entry.config.bus, "address": entry.config.address.to_string() }),
    );
    writeln!(
        out,
        "{}: connected on bus {} at {}",
        entry.title, entry.config.bus, entry.config.address
    )?;
    Ok(())
}

fn cmd_poll(args: &PollArgs, settings: &AppSettings, out: &mut dyn Write) -> Result<()> {
    let config = device_settings(&args.device, settings)
        .to_device_config()
        .map_err(|e| report(out, "poll_failed", e))?;
    let mut hat = X1200Mock::new(&config);
    poll_hat(&mut hat, args.count, Duration::from_secs(args.interval_secs), out)
}

/// Read `hat` `count` times, `delay` apart
///
/// A failed read marks that sample unavailable and polling continues.
pub fn poll_hat<H: UpsHat + ?Sized>(
    hat: &mut H,
    count: u32,
    delay: Duration,
    out: &mut dyn Write,
) -> Result<()> {
    for i in 0..count {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }

        match read_once(hat) {
            Ok((level, voltage)) => {
                debug!("poll {}: {} % {:.2} V", i, level, voltage);
                log_event("reading", json!({ "level": level, "voltage": voltage }));
                writeln!(out, "#{} level {} % voltage {:.2} V", i + 1, level, voltage)?;
            }
            Err(e) => {
                warn!("poll {}: reading unavailable: {}", i, e);
                log_event(
                    "reading_unavailable",
                    json!({ "reason": e.kind().message_key() }),
                );
                writeln!(out, "#{} unavailable ({})", i + 1, e.kind().message_key())?;
            }
        }
    }
    Ok(())
}

fn read_once<H: UpsHat + ?Sized>(hat: &mut H) -> uh_core::Result<(i32, f64)> {
    Ok((hat.battery_level()?, hat.battery_voltage()?))
}

// ============================================================================
// Settings Commands
// ============================================================================

fn cmd_settings(cmd: &SettingsCommands, out: &mut dyn Write) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            let settings = settings::load_settings()?;
            let json = serde_json::to_string_pretty(&settings)?;
            writeln!(out, "{}", json)?;
        }
        SettingsCommands::Path => {
            let path = settings::get_settings_path()?;
            writeln!(out, "{}", path.display())?;
        }
        SettingsCommands::Init { force } => {
            let path = settings::get_settings_path()?;
            if path.exists() && !force {
                writeln!(
                    out,
                    "Settings already exist at {}. Use --force to overwrite.",
                    path.display()
                )?;
                return Ok(());
            }
            let path = settings::save_settings(&AppSettings::default())
                .context("failed to write default settings")?;
            log_event("settings_init", json!({ "path": path.display().to_string() }));
            writeln!(out, "Wrote default settings to {}", path.display())?;
        }
    }
    Ok(())
}
