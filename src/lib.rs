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

//! Upshat - calibration compensation and UPS hat monitoring
//!
//! This crate is the command-line front end over `uh-core`: argument
//! parsing, command handlers and the optional JSON-lines event log.

pub mod cli;
pub mod commands;
pub mod logger;
