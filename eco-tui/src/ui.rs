use ratatui::{
    prelude::*,
    symbols,
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap,
        canvas::{Canvas, Line as CanvasLine, Points},
    },
};
use eco_core::{model::Coordinate, presentation::MapViewState};

use crate::app::{App, LoginInput, RecyclerInput, RegisterInput, Screen};

// Berazategui, Buenos Aires: where the map opens before any data arrives.
const DEFAULT_CENTER: Coordinate = Coordinate::new(-34.7653, -58.2120);
// Roughly one kilometre around the data, in degrees.
const MIN_SPAN: f64 = 0.01;

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let user = app
        .username()
        .map_or_else(|| "not logged in".to_owned(), |name| format!("user: {name}"));
    let header = Paragraph::new(format!("eco - recycling points and walking routes · {user}"))
        .block(Block::default().borders(Borders::ALL).title("Eco"));
    frame.render_widget(header, *header_area);

    match app.screen() {
        Screen::Main => draw_main(frame, app, *content_area),
        Screen::Login => draw_login(frame, &app.login, *content_area),
        Screen::Register => draw_register(frame, &app.register, *content_area),
        Screen::RecyclerProfile => draw_recycler(frame, &app.recycler, *content_area),
        Screen::CollectorProfile => draw_collector(frame, *content_area),
        Screen::Map => draw_map_screen(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen() {
        Screen::Main => "↑/↓ move · Enter select · q/Ctrl-C quit",
        Screen::Login | Screen::Register => {
            "Type to edit · Tab/↑/↓ switch field · Enter submit · Esc back · Ctrl-C quit"
        }
        Screen::RecyclerProfile => "↑/↓ move · Space toggle · Enter send · Esc back · q quit",
        Screen::CollectorProfile => "Enter/m open map · Esc back · q quit",
        Screen::Map => {
            "↑/↓ marker · Enter open/navigate · r refresh · Esc close/back · q quit"
        }
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(msg) = &app.info_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else if app.info_message.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn highlighted() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn draw_main(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .menu()
        .into_iter()
        .map(|item| ListItem::new(item.label()))
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Eco project"))
        .highlight_symbol("> ")
        .highlight_style(highlighted());

    let mut state = ListState::default();
    state.select(Some(app.menu_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn form_lines<'a>(fields: impl Iterator<Item = (&'a str, String, bool)>) -> Vec<Line<'a>> {
    fields
        .map(|(label, value, focused)| {
            let style = if focused {
                highlighted()
            } else {
                Style::default()
            };
            let cursor = if focused { "▏" } else { "" };
            Line::from(vec![
                Span::styled(format!("{label:>17}: "), style),
                Span::raw(value),
                Span::styled(cursor, style),
            ])
        })
        .collect()
}

fn masked(value: &str) -> String {
    "•".repeat(value.chars().count())
}

fn draw_login(frame: &mut Frame<'_>, login: &LoginInput, area: Rect) {
    let lines = form_lines(
        [
            ("Username", login.username.clone(), login.field == 0),
            ("Password", masked(&login.password), login.field == 1),
        ]
        .into_iter(),
    );
    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log in"));
    frame.render_widget(form, area);
}

fn draw_register(frame: &mut Frame<'_>, register: &RegisterInput, area: Rect) {
    let lines = form_lines(RegisterInput::LABELS.iter().enumerate().map(|(field, label)| {
        let value = register.value(field);
        // the last two fields are passwords
        let shown = if field >= 4 {
            masked(value)
        } else {
            value.to_owned()
        };
        (*label, shown, register.field == field)
    }));
    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("User registration"),
    );
    frame.render_widget(form, area);
}

fn draw_recycler(frame: &mut Frame<'_>, recycler: &RecyclerInput, area: Rect) {
    let items = RecyclerInput::LABELS
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let mark = if recycler.is_checked(index) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {label}"))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select the kinds of waste (Space toggles, Enter sends)"),
        )
        .highlight_symbol("> ")
        .highlight_style(highlighted());

    let mut state = ListState::default();
    state.select(Some(recycler.index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_collector(frame: &mut Frame<'_>, area: Rect) {
    let text = "Recycling map\n\nShows every recycling point the backend knows about and a \
                walking route from your position to the one you pick.\n\nPress Enter to open the map.";
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Collector"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_map_screen(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);
    let chunks = layout_chunks.as_ref();
    let [map_area, side_area] = chunks else {
        return;
    };

    let state = app.map.state();
    draw_canvas(frame, state, app.marker_index, *map_area);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(7)])
        .split(*side_area);
    let side = side_chunks.as_ref();
    let [list_area, info_area] = side else {
        return;
    };

    let refreshed = app.last_refresh.map_or_else(
        || "press r to load".to_owned(),
        |at| format!("updated {}", at.format("%H:%M:%S")),
    );
    let items = if state.markers.is_empty() {
        vec![ListItem::new("No recycling points on the map.")]
    } else {
        state
            .markers
            .iter()
            .map(|marker| ListItem::new(marker.label.clone()))
            .collect()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Recycling points ({refreshed})")),
        )
        .highlight_symbol("> ")
        .highlight_style(highlighted());
    let mut list_state = ListState::default();
    if !state.markers.is_empty() {
        list_state.select(Some(app.marker_index));
    }
    frame.render_stateful_widget(list, *list_area, &mut list_state);

    let info = match app.map.open_marker() {
        Some(marker) => format!(
            "{}\n{}\n\n[Enter] Go here   [Esc] Close",
            marker.label, marker.position
        ),
        None => {
            let route = state.route.as_ref().map_or_else(
                || "No route".to_owned(),
                |route| format!("Route: {} points", route.len()),
            );
            let diagnostic = app
                .last_diagnostic
                .as_ref()
                .map(|diagnostic| {
                    format!(
                        "\n{} {}",
                        diagnostic.at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                        diagnostic.message
                    )
                })
                .unwrap_or_default();
            format!("{route}{diagnostic}")
        }
    };
    let info = Paragraph::new(info)
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, *info_area);

    if let Some(dialog) = &state.dialog {
        let popup = centered(*map_area, 50, 7);
        frame.render_widget(Clear, popup);
        let body = Paragraph::new(format!("{}\n\n[ OK ]", dialog.message))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(dialog.title.as_str())
                    .style(Style::default().fg(Color::Red)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(body, popup);
    }
}

fn draw_canvas(frame: &mut Frame<'_>, state: &MapViewState, selected: usize, area: Rect) {
    let ([west, east], [south, north]) = bounds(state);

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Map"))
        .marker(symbols::Marker::Braille)
        .x_bounds([west, east])
        .y_bounds([south, north])
        .paint(|ctx| {
            if let Some(route) = &state.route {
                for pair in route.points().windows(2) {
                    if let [from, to] = pair {
                        ctx.draw(&CanvasLine {
                            x1: from.longitude,
                            y1: from.latitude,
                            x2: to.longitude,
                            y2: to.latitude,
                            color: Color::Cyan,
                        });
                    }
                }
            }
            ctx.layer();
            let pins: Vec<(f64, f64)> = state
                .markers
                .iter()
                .map(|marker| (marker.position.longitude, marker.position.latitude))
                .collect();
            ctx.draw(&Points {
                coords: &pins,
                color: Color::Green,
            });
            if let Some(marker) = state.markers.get(selected) {
                ctx.print(
                    marker.position.longitude,
                    marker.position.latitude,
                    Span::styled("◆", highlighted()),
                );
            }
        });
    frame.render_widget(canvas, area);
}

/// `([west, east], [south, north])` enclosing markers and route, padded.
fn bounds(state: &MapViewState) -> ([f64; 2], [f64; 2]) {
    let coordinates: Vec<Coordinate> = state
        .markers
        .iter()
        .map(|marker| marker.position)
        .chain(state.route.iter().flat_map(|route| route.points().iter().copied()))
        .collect();

    if coordinates.is_empty() {
        let half = MIN_SPAN / 2.0;
        return (
            [DEFAULT_CENTER.longitude - half, DEFAULT_CENTER.longitude + half],
            [DEFAULT_CENTER.latitude - half, DEFAULT_CENTER.latitude + half],
        );
    }

    let fold = |pick: fn(&Coordinate) -> f64| {
        coordinates
            .iter()
            .map(pick)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
                (low.min(value), high.max(value))
            })
    };
    let pad = |(low, high): (f64, f64)| {
        let margin = ((high - low) * 0.1).max(MIN_SPAN / 2.0);
        [low - margin, high + margin]
    };
    (
        pad(fold(|coordinate| coordinate.longitude)),
        pad(fold(|coordinate| coordinate.latitude)),
    )
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    let middle = vertical.get(1).copied().unwrap_or(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(middle);
    horizontal.get(1).copied().unwrap_or(middle)
}

#[cfg(test)]
mod tests {
    use eco_core::{
        model::{RecyclingId, RecyclingPoint, Route},
        presentation::MapPresentation,
    };

    use super::*;

    #[test]
    fn empty_map_is_centred_on_default() {
        let ([west, east], [south, north]) = bounds(&MapViewState::default());
        assert!(west < DEFAULT_CENTER.longitude && DEFAULT_CENTER.longitude < east);
        assert!(south < DEFAULT_CENTER.latitude && DEFAULT_CENTER.latitude < north);
    }

    #[test]
    fn bounds_cover_markers_and_route() {
        let mut map = MapPresentation::new();
        map.show_points(&[RecyclingPoint {
            id: RecyclingId(1),
            address: "A".to_owned(),
            latitude: Some(-34.70),
            longitude: Some(-58.20),
            collector_id: None,
        }]);
        map.show_route(Route::fallback(
            Coordinate::new(-34.80, -58.30),
            Coordinate::new(-34.70, -58.20),
        ));

        let ([west, east], [south, north]) = bounds(map.state());
        assert!(west < -58.30 && east > -58.20);
        assert!(south < -34.80 && north > -34.70);
    }
}
