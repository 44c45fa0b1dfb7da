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


use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use hwt_core::SensorType;

use crate::app::App;

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn to_tui_color(color: hwt_core::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Reading with the precision usual for its sensor type
pub fn format_value(value: f32, sensor_type: SensorType) -> String {
    let unit = sensor_type.unit();
    let number = match sensor_type {
        SensorType::Voltage => format!("{:.3}", value),
        SensorType::Fan | SensorType::Clock | SensorType::SmallData => format!("{:.0}", value),
        SensorType::Factor => format!("{:.2}", value),
        _ => format!("{:.1}", value),
    };
    if unit.is_empty() {
        number
    } else {
        format!("{} {}", number, unit)
    }
}

pub fn draw_rename_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 25, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Rename ");
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let default_text = app.selected().map(|n| n.default_text.as_str()).unwrap_or_default();
    let lines = vec![
        Line::from(format!("Default: {}", default_text)),
        Line::from(""),
        Line::from(format!("Name: {}_", app.rename_input)),
        Line::from(""),
        Line::styled(
            "Enter: apply  |  empty: restore default  |  Esc: cancel",
            Style::default().fg(Color::Gray),
        ),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Left).wrap(Wrap { trim: false });
    f.render_widget(p, inner);
}
