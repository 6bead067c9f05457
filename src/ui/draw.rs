use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::canvas::{Canvas, Map, MapResolution};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
// Popup from tui-widgets renders the confirm modal
use tui_widgets::popup::Popup;

use crate::map::MapMode;
use crate::router::Action;

use super::app::App;
use super::form::FormField;

const BROWSE_HELP: &str = "j/k: nav  Enter: actions  a: add  /: search  q: quit";
const SEARCH_HELP: &str = "Type to filter  Enter/Esc: back to list";
const POPOVER_HELP: &str = "j/k: nav  Enter: run  e/d/v/c: direct  Esc: close";
const FORM_HELP: &str = "Tab: next field  Enter: submit  Esc: cancel";
const PICKER_HELP: &str = " arrows: pan  +/-: zoom  g: my position  Enter: accept  Esc: close ";
const CONFIRM_HELP: &str = "y/Enter: confirm  n/Esc: cancel";

/// Column width of the "Label:" prefix in the contact form.
const FORM_LABEL_WIDTH: u16 = 10;

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);

    // Overlays, bottom to top
    draw_popover(frame, size, app);
    draw_form_modal(frame, size, app);
    draw_picker_modal(frame, size, app);
    draw_confirm_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let value_style = if app.search_focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(" Search: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(app.search_input.value().to_string(), value_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    if app.search_focused {
        let x = area.x + 9 + app.search_input.visual_cursor() as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
    }
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_contact_list(frame, chunks[0], app);
    draw_map_pane(frame, chunks[1], app);
}

fn draw_contact_list(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let block = Block::default().borders(Borders::ALL).title(" CONTACTS ");
    let inner = block.inner(area);

    let items: Vec<ListItem> = app
        .filtered
        .iter()
        .filter_map(|&index| app.store.get(index))
        .map(|contact| {
            let marker = if contact.location.is_some() {
                "\u{25c9} "
            } else {
                "  "
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    contact.company.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  {}  {}", contact.manager, contact.phone)),
            ]))
        })
        .collect();

    if items.is_empty() {
        let empty_text = if app.store.is_empty() {
            "No contacts yet  (a: add)"
        } else {
            "No matching contacts"
        };
        frame.render_widget(block, area);
        frame.render_widget(
            Paragraph::new(empty_text).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        app.list_area = inner;
        app.list_offset = 0;
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default()
        .with_offset(app.list_offset)
        .with_selected(Some(app.selected_row));
    frame.render_stateful_widget(list, area, &mut state);

    // Remember the scroll window so the popover can anchor to its row
    app.list_area = inner;
    app.list_offset = state.offset();
}

fn draw_map_pane(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let selected_id = app.selected_contact().map(|c| c.id);
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(" MAP "))
        .x_bounds(app.map.x_bounds())
        .y_bounds(app.map.y_bounds())
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::Gray,
                resolution: MapResolution::High,
            });
            if app.map.mode() != MapMode::View {
                return;
            }
            for contact in app.map_markers() {
                let Some(location) = contact.location else {
                    continue;
                };
                let style = if selected_id == Some(contact.id) {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                ctx.print(
                    location.lng,
                    location.lat,
                    Span::styled(format!("\u{25c9} {}", contact.company), style),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let help = if app.confirm_modal.is_some() {
        CONFIRM_HELP
    } else if let Some(form) = &app.form {
        if form.picker.is_some() {
            PICKER_HELP
        } else {
            FORM_HELP
        }
    } else if app.gate.popover().is_some() {
        POPOVER_HELP
    } else if app.search_focused {
        SEARCH_HELP
    } else {
        BROWSE_HELP
    };

    let count = format!(" {}/{} ", app.filtered.len(), app.store.len());
    let line = match &app.status {
        Some(status) => Line::from(vec![
            Span::raw(count),
            Span::styled(status.clone(), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled(help, Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(vec![
            Span::raw(count),
            Span::styled(help, Style::default().fg(Color::DarkGray)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_popover(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some((target, anchor)) = app.gate.popover() else {
        return;
    };

    let title = app
        .store
        .by_id(target)
        .map(|c| format!(" {} ", c.company))
        .unwrap_or_else(|| " ACTIONS ".to_string());

    let label_width = Action::ALL
        .iter()
        .map(|a| a.label().len())
        .max()
        .unwrap_or(0) as u16;
    let width = (label_width + 6).max(title.len() as u16 + 2).min(area.width);
    let height = (Action::ALL.len() as u16 + 2).min(area.height);

    let (x, mut y) = anchor.popover_origin(width, area.width);
    if y + height > area.height {
        y = area.height.saturating_sub(height);
    }
    let popover_area = Rect::new(x.min(area.width.saturating_sub(width)), y, width, height);

    frame.render_widget(Clear, popover_area);

    let items: Vec<ListItem> = Action::ALL
        .iter()
        .map(|action| ListItem::new(action.label()))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.popover_index));
    frame.render_stateful_widget(list, popover_area, &mut state);
}

fn draw_form_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor: Option<(u16, u16)> = None;

    for field in FormField::ALL {
        let focused = form.focus == field;
        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let label = format!("{:<width$}", format!("{}:", field.label()), width = 9);

        match form.input(field) {
            Some(input) => {
                if focused {
                    cursor = Some((
                        FORM_LABEL_WIDTH + input.visual_cursor() as u16,
                        lines.len() as u16,
                    ));
                }
                lines.push(Line::from(vec![
                    Span::styled(label, label_style),
                    Span::raw(" "),
                    Span::raw(input.value().to_string()),
                ]));
                if let Some(error) = form.errors.for_field(field) {
                    lines.push(Line::from(Span::styled(
                        format!("{:width$} {}", "", error, width = 9),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
            None => {
                // Location pseudo-field
                let value = match form.location {
                    Some(location) => format!("{:.4}, {:.4}", location.lat, location.lng),
                    None => "not set".to_string(),
                };
                let hint = if focused { "  (Enter: pick on map, x: clear)" } else { "" };
                lines.push(Line::from(vec![
                    Span::styled(label, label_style),
                    Span::raw(" "),
                    Span::raw(value),
                    Span::styled(hint, Style::default().fg(Color::DarkGray)),
                ]));
            }
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        FORM_HELP,
        Style::default().fg(Color::DarkGray),
    )));

    let width = area.width.min(52);
    let height = (lines.len() as u16 + 2).min(area.height);
    let modal_area = centered_rect(width, height, area);
    let block = Block::default().borders(Borders::ALL).title(form.title());
    let inner = block.inner(modal_area);

    frame.render_widget(Clear, modal_area);
    frame.render_widget(Paragraph::new(lines).block(block), modal_area);

    // Text cursor only when the picker is not covering the form
    if form.picker.is_none() {
        if let Some((dx, dy)) = cursor {
            let x = (inner.x + dx).min(inner.right().saturating_sub(1));
            frame.set_cursor_position((x, inner.y + dy));
        }
    }
}

fn draw_picker_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };
    let Some(picker) = form.picker.as_ref() else {
        return;
    };

    let width = (area.width.saturating_mul(4) / 5).max(area.width.min(40));
    let height = (area.height.saturating_mul(4) / 5).max(area.height.min(12));
    let modal_area = centered_rect(width, height, area);

    let center = picker.map.center();
    let title = format!(" PICK LOCATION  {:.4}, {:.4} ", center.lat, center.lng);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_bottom(Line::from(PICKER_HELP).centered());

    frame.render_widget(Clear, modal_area);

    let canvas = Canvas::default()
        .block(block)
        .x_bounds(picker.map.x_bounds())
        .y_bounds(picker.map.y_bounds())
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::Gray,
                resolution: MapResolution::High,
            });
            if let Some(location) = form.location {
                ctx.print(
                    location.lng,
                    location.lat,
                    Span::styled("\u{25c9}", Style::default().fg(Color::Cyan)),
                );
            }
            // Crosshair marks the candidate coordinate
            ctx.print(
                center.lng,
                center.lat,
                Span::styled(
                    "\u{271b}",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            );
        });
    frame.render_widget(canvas, modal_area);
}

fn draw_confirm_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.confirm_modal.as_ref() else {
        return;
    };

    let body = Text::from(vec![
        Line::from(modal.message.clone()),
        Line::raw(""),
        Line::from(CONFIRM_HELP),
    ]);
    let popup = Popup::new(body)
        .title(Line::from(modal.title.clone()))
        .border_style(Style::default().fg(Color::Red));
    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
