// ui.rs

use std::ops::Range;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Wrap,
        canvas::{Canvas, Context, Line as CanvasLine, Points},
    },
};

use geojson::Value;

use crate::app::{App, AppMode, CurrentScreen, Focus};
use crate::filter::{Choice, Dimension};
use crate::layers::{LayerKind, MapView, Tooltip};
use crate::loader::describe_sources;
use crate::render::viewport;
use crate::style::{MapColor, scheme_style};

pub fn render(frame: &mut Frame, app: &mut App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)]) // Main content, then footer
        .split(frame.size());

    match app.current_screen {
        CurrentScreen::Help => render_help_screen(frame, app, main_layout[0]),
        CurrentScreen::Dashboard => render_dashboard(frame, app, main_layout[0]),
    }

    render_footer(frame, app, main_layout[1]);
}

/// Terminal color for a map style. Black ink is drawn white so boundaries
/// stay visible on dark terminals.
fn tui_color(color: MapColor) -> Color {
    match color {
        MapColor::Black => Color::White,
        other => {
            let (r, g, b) = other.rgb();
            Color::Rgb(r, g, b)
        }
    }
}

/// Rows `[start, end)` to draw so that `cursor` stays inside a window of `height`.
fn visible_window(cursor: usize, len: usize, height: usize) -> Range<usize> {
    if height == 0 || len == 0 {
        return 0..0;
    }
    let start = cursor
        .saturating_sub(height - 1)
        .min(len.saturating_sub(height));
    start..(start + height).min(len)
}

fn render_help_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(" Help Screen ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(app.help_keybinds.iter().map(|s| Line::from(format!("  {s}"))));
    lines.push(Line::from(""));
    lines.push(Line::from("Press any key to return to the dashboard."));

    let help_text = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::LightGreen));

    frame.render_widget(help_text, area);
}

fn render_dashboard(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Notification
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Main content area
        ])
        .split(area);

    let notification_paragraph = Paragraph::new(app.notification.clone())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(notification_paragraph, chunks[0]);
    frame.render_widget(Paragraph::new(""), chunks[1]);

    let main_content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(app.left_pane_width_percentage),
            Constraint::Percentage(100 - app.left_pane_width_percentage),
        ])
        .split(chunks[2]);

    // --- Left Panel: cascading filter lists ---
    let filter_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(main_content_layout[0]);
    for (dimension, chunk) in Dimension::ORDER.into_iter().zip(filter_chunks.iter()) {
        render_filter_list(frame, app, dimension, *chunk);
    }

    // --- Right Panel ---
    let right_panel_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Metrics, layers, sources
            Constraint::Min(0),    // Map preview
            Constraint::Length(9), // Road inspector
        ])
        .split(main_content_layout[1]);

    let top_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(35),
            Constraint::Percentage(35),
        ])
        .split(right_panel_chunks[0]);

    match app.view() {
        Some(view) => {
            render_metrics(frame, &view, top_row[0]);
            render_layer_control(frame, &view, top_row[1]);
            render_map_preview(frame, app, &view, right_panel_chunks[1]);
        }
        None => {
            let waiting = Paragraph::new("No data loaded. Press F5 to load.")
                .block(Block::default().borders(Borders::ALL).title(" Map "))
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(waiting, right_panel_chunks[1]);
        }
    }
    render_sources(frame, app, top_row[2]);
    render_road_inspector(frame, app, right_panel_chunks[2]);

    // divider for resizing the main panels
    let divider_x_pos = main_content_layout[0].x + main_content_layout[0].width;
    app.divider_x = divider_x_pos;
    let buffer_area = frame.size();
    if divider_x_pos < buffer_area.right() {
        for y in main_content_layout[0].y..main_content_layout[0].bottom() {
            let style = if app.is_resizing {
                Style::default().bg(Color::LightRed)
            } else {
                Style::default().bg(Color::DarkGray)
            };
            frame
                .buffer_mut()
                .get_mut(divider_x_pos, y)
                .set_symbol("│")
                .set_style(style);
        }
    }
}

fn render_filter_list(frame: &mut Frame, app: &App, dimension: Dimension, area: Rect) {
    let focused = app.focus == Focus::Filter(dimension);
    let offered = app.offered(dimension);
    let stage = app.pipeline.stage(dimension);
    let cursor = app.option_cursor(dimension);
    let selected_count = offered
        .iter()
        .filter(|v| stage.is_some_and(|s| s.is_selected(v)))
        .count();

    let mut lines: Vec<Line> = Vec::new();
    let height = area.height.saturating_sub(2) as usize;
    for i in visible_window(cursor, offered.len(), height) {
        let value = &offered[i];
        let selected = stage.is_some_and(|s| s.is_selected(value));
        let indicator = match (dimension.choice(), selected) {
            (Choice::Single, true) => "(o)",
            (Choice::Single, false) => "( )",
            (Choice::Multi, true) => "[x]",
            (Choice::Multi, false) => "[ ]",
        };
        let mut style = Style::default().fg(Color::White);
        if dimension == Dimension::Scheme && selected {
            style = style.fg(tui_color(scheme_style(Some(value.as_str())).color));
        }
        if focused && i == cursor {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(vec![Span::styled(
            format!("{indicator} {value}"),
            style,
        )]));
    }
    if offered.is_empty() {
        lines.push(Line::from("No options for the current selection").fg(Color::Gray));
    }

    let border = if focused {
        Color::LightYellow
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(format!(
            " {} ({}/{}) ",
            dimension.label(),
            selected_count,
            offered.len()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_metrics(frame: &mut Frame, view: &MapView<'_>, area: Rect) {
    let block = Block::default()
        .title(" Summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue));
    let lines = vec![
        Line::from("Total Roads"),
        Line::from(view.summary.road_count.to_string()).bold().fg(Color::LightCyan),
        Line::from("Connected Population"),
        Line::from(view.summary.population.to_string()).bold().fg(Color::LightCyan),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_layer_control(frame: &mut Frame, view: &MapView<'_>, area: Rect) {
    let block = Block::default()
        .title(" Layers ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightYellow));
    let lines: Vec<Line> = LayerKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| match view.layer(*kind) {
            Some(layer) => Line::from(format!(
                "{} [{}] {} ({})",
                i + 1,
                if layer.visible { "x" } else { " " },
                kind.name(),
                layer.features.len()
            )),
            None => Line::from(format!("{}  -  {} (not loaded)", i + 1, kind.name())).fg(Color::Gray),
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_sources(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Sources ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue));
    let mut lines = Vec::new();
    match app.dataset() {
        Some(dataset) => {
            for (name, count) in describe_sources(&app.config.sources, dataset) {
                lines.push(Line::from(format!("{}: {}", name.display(), count)));
            }
            lines.push(Line::from(format!(
                "Loaded: {}",
                dataset.loaded_at.format("%Y-%m-%d %H:%M")
            )));
        }
        None => lines.push(Line::from("Loading data...").fg(Color::Gray)),
    }
    let output_style = if app.current_mode == AppMode::EditingFilename {
        Style::default().fg(Color::White).bg(Color::Blue)
    } else {
        Style::default().fg(Color::White)
    };
    lines.push(Line::from(vec![
        Span::raw("Output: "),
        Span::styled(app.output_filename_buffer.clone(), output_style),
    ]));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
    if app.current_mode == AppMode::EditingFilename {
        let inner = Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        };
        let row = inner.y + inner.height.saturating_sub(1);
        // cursor counts characters, one cell each
        let offset = u16::try_from(app.output_filename_cursor).unwrap_or(u16::MAX);
        let col = (inner.x + 8).saturating_add(offset);
        if col < inner.right() {
            frame.set_cursor(col, row);
        }
    }
}

fn paint_features(ctx: &mut Context<'_>, view: &MapView<'_>) {
    for layer in view.visible_layers() {
        for feature in &layer.features {
            let color = tui_color(feature.style.color);
            paint_value(ctx, &feature.geometry.value, color);
        }
    }
}

fn paint_path(ctx: &mut Context<'_>, coords: &[Vec<f64>], color: Color) {
    for pair in coords.windows(2) {
        if let ([x1, y1, ..], [x2, y2, ..]) = (pair[0].as_slice(), pair[1].as_slice()) {
            ctx.draw(&CanvasLine {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
                color,
            });
        }
    }
}

fn paint_value(ctx: &mut Context<'_>, value: &Value, color: Color) {
    match value {
        Value::Point(c) if c.len() >= 2 => ctx.draw(&Points {
            coords: &[(c[0], c[1])],
            color,
        }),
        Value::Point(_) => {}
        Value::MultiPoint(coords) => {
            let points: Vec<(f64, f64)> = coords
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect();
            ctx.draw(&Points {
                coords: &points,
                color,
            });
        }
        Value::LineString(line) => paint_path(ctx, line, color),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| paint_path(ctx, l, color)),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                paint_path(ctx, exterior, color);
            }
        }
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first())
            .for_each(|exterior| paint_path(ctx, exterior, color)),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .for_each(|g| paint_value(ctx, &g.value, color)),
    }
}

fn render_map_preview(frame: &mut Frame, app: &App, view: &MapView<'_>, area: Rect) {
    let bounds = viewport(view, &app.config.map);
    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(" Map ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightGreen)),
        )
        .marker(Marker::Braille)
        .x_bounds([bounds.min_lon, bounds.max_lon])
        .y_bounds([bounds.min_lat, bounds.max_lat])
        .paint(|ctx| paint_features(ctx, view));
    frame.render_widget(canvas, area);
}

fn render_road_inspector(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Roads;
    let roads = app.filtered_roads();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let height = chunks[0].height.saturating_sub(2) as usize;
    let list: Vec<Line> = visible_window(app.road_cursor, roads.len(), height)
        .map(|i| {
            let road = roads[i];
            let name = road.name.as_deref().unwrap_or("(unnamed)");
            let mut style =
                Style::default().fg(tui_color(scheme_style(road.scheme.as_deref()).color));
            if focused && i == app.road_cursor {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            Line::from(vec![Span::styled(format!("{}. {}", i + 1, name), style)])
        })
        .collect();
    let border = if focused {
        Color::LightYellow
    } else {
        Color::DarkGray
    };
    frame.render_widget(
        Paragraph::new(list).block(
            Block::default()
                .title(format!(" Roads ({}) ", roads.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        ),
        chunks[0],
    );

    let tooltip = Tooltip::for_roads(&app.config.fields);
    let details: Vec<Line> = match roads.get(app.road_cursor) {
        Some(road) => tooltip
            .rows(&road.properties)
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label}: "), Style::default().fg(Color::LightCyan)),
                    Span::raw(value),
                ])
            })
            .collect(),
        None => vec![Line::from("No road selected").fg(Color::Gray)],
    };
    frame.render_widget(
        Paragraph::new(details)
            .block(
                Block::default()
                    .title(" Road Details ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightCyan)),
            )
            .wrap(Wrap { trim: false }),
        chunks[1],
    );
}

/// Renders a common footer area.
fn render_footer(frame: &mut Frame, app: &mut App, area: Rect) {
    let current_screen_name = match app.current_screen {
        CurrentScreen::Dashboard => "Dashboard",
        CurrentScreen::Help => "Help",
    };

    let current_mode_name = match app.current_mode {
        AppMode::Navigation => "Navigation",
        AppMode::EditingFilename => "Editing Filename",
    };

    let footer_text = Line::from(vec![
        Span::raw("Screen: "),
        Span::styled(
            current_screen_name,
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Mode: "),
        Span::styled(
            current_mode_name,
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Press "),
        Span::styled(
            "q",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        ),
        Span::raw(" to quit "),
        Span::raw(" | Press "),
        Span::styled(
            "h",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Green),
        ),
        Span::raw(" for Help "),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(footer, area);
}
