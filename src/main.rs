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

use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use upshat::cli::Cli;
use upshat::{commands, logger};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let settings = match uh_core::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load settings, using defaults: {}", e);
            uh_core::AppSettings::default()
        }
    };

    if cli.logging || settings.logging.event_log {
        let requested = settings.logging.resolved_event_log_path();
        match logger::init_logging(&requested) {
            Some(path) => debug!("Event log: {}", path.display()),
            None => warn!("Event log unavailable at {}", requested.display()),
        }
        logger::log_event("startup", json!({ "version": env!("CARGO_PKG_VERSION") }));
    }

    let mut stdout = std::io::stdout().lock();
    let result = commands::execute(&cli.command, &settings, &mut stdout);
    logger::shutdown_logging();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
