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

//! Structured event log
//!
//! One JSON object per line: `{"ts_ms": .., "event": .., "data": ..}`.
//! Events are dropped silently until [`init_logging`] has been called.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

use uh_core::constants::paths;

struct EventLog {
    file: File,
    path: PathBuf,
}

lazy_static! {
    static ref LOG_FILE: Mutex<Option<EventLog>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn open_append(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Start appending events to `path`
///
/// Falls back to `/tmp/upshat_events.jsonl` when `path` cannot be opened.
/// Returns the file actually in use, if any.
pub fn init_logging(path: &Path) -> Option<PathBuf> {
    let fallback = Path::new(paths::FALLBACK_EVENT_LOG);
    let (file, used) = match open_append(path) {
        Some(f) => (f, path.to_path_buf()),
        None => (open_append(fallback)?, fallback.to_path_buf()),
    };

    let mut guard = LOG_FILE.lock().ok()?;
    *guard = Some(EventLog {
        file,
        path: used.clone(),
    });
    Some(used)
}

/// Stop logging and close the file
pub fn shutdown_logging() {
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = None;
    }
}

/// Path of the active event log
pub fn active_log_path() -> Option<PathBuf> {
    LOG_FILE
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|log| log.path.clone()))
}

pub fn log_event(event: &str, data: Value) {
    let line = json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string();

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(log) = guard.as_mut() {
            let _ = writeln!(log.file, "{}", line);
        }
    }
}
