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


use crossterm::event::{KeyCode, KeyEvent};

use crate::app::App;
use crate::handlers::*;

/// Process one key press; returns `true` when the app should quit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> anyhow::Result<bool> {
    let KeyEvent { code, .. } = key_event;

    // Popups take every key while open
    if app.show_rename_popup {
        handle_rename_popup(app, code)?;
        return Ok(false);
    }

    handle_global_events(app, code)
}

fn handle_rename_popup(app: &mut App, code: KeyCode) -> anyhow::Result<()> {
    match code {
        KeyCode::Esc => cancel_rename(app),
        KeyCode::Enter => apply_rename(app),
        KeyCode::Backspace => {
            app.rename_input.pop();
        }
        KeyCode::Char(c) => app.rename_input.push(c),
        _ => {}
    }
    Ok(())
}

fn handle_global_events(app: &mut App, code: KeyCode) -> anyhow::Result<bool> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-10),
        KeyCode::PageDown => app.move_selection(10),
        KeyCode::Enter | KeyCode::Char(' ') => toggle_collapsed(app),
        KeyCode::Char('p') => toggle_plot(app),
        KeyCode::Char('o') => toggle_overview(app),
        KeyCode::Char('h') => toggle_hidden(app),
        KeyCode::Char('H') => toggle_show_hidden(app),
        KeyCode::Char('P') => toggle_show_plot(app),
        KeyCode::Char('c') => cycle_pen_color(app),
        KeyCode::Char('C') => reset_pen_color(app),
        KeyCode::Char('n') => new_virtual_container(app),
        KeyCode::Char('a') => add_virtual_sensor(app),
        KeyCode::Char('t') => cycle_new_sensor_type(app),
        KeyCode::Char('d') => delete_virtual(app),
        KeyCode::Char('r') => start_rename(app),
        KeyCode::Char('+') => adjust_refresh(app, true),
        KeyCode::Char('-') => adjust_refresh(app, false),
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::loaded_app as app;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert!(handle_key_event(&mut app, key(KeyCode::Esc)).unwrap());
        assert!(!handle_key_event(&mut app, key(KeyCode::Down)).unwrap());
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn test_rename_popup_captures_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('r'))).unwrap();
        assert!(app.show_rename_popup);

        app.rename_input.clear();
        for c in "qX".chars() {
            assert!(!handle_key_event(&mut app, key(KeyCode::Char(c))).unwrap());
        }
        handle_key_event(&mut app, key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.rename_input, "q");

        // Esc closes the popup instead of quitting
        assert!(!handle_key_event(&mut app, key(KeyCode::Esc)).unwrap());
        assert!(!app.show_rename_popup);
    }

    #[test]
    fn test_collapse_hides_children() {
        let mut app = app();
        app.selected = 0;
        let before = app.rows.len();
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.rows.len() < before);
        handle_key_event(&mut app, key(KeyCode::Char(' '))).unwrap();
        assert_eq!(app.rows.len(), before);
    }
}
