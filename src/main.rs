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


use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use tracing::{info, warn};

use hwtree::app::{build_monitor, App};
use hwtree::config::{log_file_path, CliOptions};
use hwtree::events::handle_key_event;
use hwtree::logger::{init_logging, LogTarget};
use hwtree::service::run_headless;
use hwtree::ui::ui;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

fn main() -> anyhow::Result<()> {
    let opts = CliOptions::parse();

    let settings_file = opts.settings_file()?;

    if opts.headless {
        init_logging(&LogTarget::Stderr)?;
    } else if opts.logging {
        init_logging(&LogTarget::File(log_file_path(&settings_file)))?;
    }
    info!(settings = %settings_file.display(), demo = opts.demo, "hwtree {} starting", env!("CARGO_PKG_VERSION"));

    let mut monitor = build_monitor(&settings_file, opts.demo);

    if opts.headless {
        if let Err(e) = ctrlc::set_handler(|| {
            info!("SIGNAL: Received SIGINT/SIGTERM - stopping");
            SHUTDOWN.store(true, Ordering::SeqCst);
        }) {
            warn!("Failed to set signal handler: {}", e);
        }
        run_headless(&mut monitor, opts.ticks, &SHUTDOWN, &mut stdout().lock())?;
        return Ok(());
    }

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(monitor);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let saved = app.monitor.shutdown();

    if let Err(err) = res {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = saved {
        eprintln!("error: failed to save settings: {err}");
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    app.refresh();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = app.refresh_interval().saturating_sub(app.last_refresh.elapsed());
        if event::poll(timeout).unwrap_or(false) {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(app, key_event)? {
                    return Ok(());
                }
            }
        }

        if app.last_refresh.elapsed() >= app.refresh_interval() {
            app.refresh();
        }
    }
}
