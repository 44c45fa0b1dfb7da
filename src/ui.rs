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


mod components;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph};

use hwt_core::{NodeKind, TreeRow};

use crate::app::App;
use components::{draw_rename_popup, format_value, to_tui_color};

const HELP: &str = "↑/↓ move | Enter fold | p plot | o overview | h hide | H show hidden | P plotting | c/C color | n/a/t/d virtual | r rename | +/- rate | q quit";

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(2)])
        .split(size);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(outer[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main[1]);

    draw_tree(f, app, main[0]);
    draw_overview(f, app, right[0]);
    draw_plot(f, app, right[1]);

    let status = Paragraph::new(vec![
        Line::from(app.status.as_str()),
        Line::from(HELP),
    ])
    .style(Style::default().fg(Color::Gray));
    f.render_widget(status, outer[1]);

    if app.show_rename_popup {
        draw_rename_popup(f, app);
    }
}

fn tree_row_line(app: &App, row: &TreeRow) -> Line<'static> {
    let tree = app.monitor.tree();
    let Some(node) = tree.get(row.id) else {
        return Line::from("");
    };

    let fold = if tree.children(row.id).is_empty() {
        "  "
    } else if node.collapsed {
        "▸ "
    } else {
        "▾ "
    };
    let mut style = Style::default();
    if let Some(color) = app.monitor.text_color(row.id) {
        style = style.fg(to_tui_color(color));
    }
    if matches!(node.kind, NodeKind::Hardware(_)) {
        style = style.add_modifier(Modifier::BOLD);
    }

    let mut spans = vec![
        Span::raw("  ".repeat(row.depth)),
        Span::raw(fold),
        Span::styled(node.text.clone(), style),
    ];
    if let Some(sensor) = node.as_sensor() {
        if let Some(value) = app.monitor.sensor_value(row.id) {
            spans.push(Span::raw(format!("  {}", format_value(value, sensor.sensor_type))));
        }
        let mut flags = String::new();
        if sensor.plot {
            flags.push('P');
        }
        if sensor.overview {
            flags.push('O');
        }
        if !flags.is_empty() {
            spans.push(Span::styled(format!(" [{}]", flags), Style::default().fg(Color::DarkGray)));
        }
    }
    Line::from(spans)
}

fn draw_tree(f: &mut Frame, app: &App, area: Rect) {
    let tree = app.monitor.tree();
    let host = tree.get(tree.root()).map(|n| n.text.as_str()).unwrap_or("Sensors");
    let title = format!(" {} ", host);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title);

    if app.rows.is_empty() {
        let text = if app.monitor.hardware_loaded() { "(everything hidden)" } else { "Waiting for hardware..." };
        let p = Paragraph::new(text).alignment(Alignment::Center).block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = app.rows.iter().map(|row| ListItem::new(tree_row_line(app, row))).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_overview(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Overview ");

    let tree = app.monitor.tree();
    let mut lines = Vec::new();
    for id in app.monitor.overview() {
        let Some(node) = tree.get(*id) else { continue };
        let Some(sensor) = node.as_sensor() else { continue };
        let hardware = tree
            .owning_hardware(*id)
            .and_then(|hw| tree.get(hw))
            .map(|hw| hw.text.as_str())
            .unwrap_or_default();
        let value = app
            .monitor
            .sensor_value(*id)
            .map(|v| format_value(v, sensor.sensor_type))
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(vec![
            Span::styled(format!("{:<24}", node.text), Style::default().fg(Color::White)),
            Span::raw(format!("{:>12}  ", value)),
            Span::styled(hardware.to_string(), Style::default().fg(Color::DarkGray)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::styled("No sensors in the overview (o to add)", Style::default().fg(Color::Gray)));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_plot(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" Plot ({} ms) ", app.refresh_interval().as_millis()));

    if !app.monitor.config().show_plot {
        let p = Paragraph::new("Plotting off (P to enable)").alignment(Alignment::Center).block(block);
        f.render_widget(p, area);
        return;
    }

    let tree = app.monitor.tree();
    let series: Vec<(String, Color, Vec<(f64, f64)>)> = app
        .monitor
        .plot_colors()
        .iter()
        .filter_map(|(id, color)| {
            let node = tree.get(id)?;
            let samples = app.history.get(&node.identifier)?;
            Some((node.text.clone(), to_tui_color(color), samples.iter().copied().collect()))
        })
        .collect();

    if series.is_empty() {
        let p = Paragraph::new("No plotted sensors (p to add)").alignment(Alignment::Center).block(block);
        f.render_widget(p, area);
        return;
    }

    let (mut y_min, mut y_max) = (f64::MAX, f64::MIN);
    for (_, _, points) in &series {
        for (_, y) in points {
            y_min = y_min.min(*y);
            y_max = y_max.max(*y);
        }
    }
    if y_min > y_max {
        (y_min, y_max) = (0.0, 1.0);
    }
    let pad = ((y_max - y_min) * 0.1).max(1.0);
    let (y_min, y_max) = (y_min - pad, y_max + pad);
    let x_max = app.ticks as f64;
    let x_min = (x_max - crate::app::HISTORY_LEN as f64).max(0.0);

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|(name, color, points)| {
            Dataset::default()
                .name(name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(*color))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max.max(1.0)])
                .labels(vec![Span::raw("old"), Span::raw("now")])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.0}", y_max)),
                ])
                .style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(chart, area);
}
