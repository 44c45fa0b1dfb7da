/*
 * This file is part of hwtree.
 *
 * Copyright (C) 2025 hwtree contributors
 *
 * hwtree is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * hwtree is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with hwtree. If not, see <https://www.gnu.org/licenses/>.
 */


//! hwtree - hardware sensor tree TUI for Linux
//!
//! Terminal front end over `hwt-core`: a collapsible sensor tree, an overview
//! pane, live plots of selected sensors, and a headless mode that prints the
//! overview as JSON lines.

pub mod app;
pub mod config;
pub mod events;
pub mod handlers;
pub mod logger;
pub mod service;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
