//! Listeners step: table of saved listeners + key handlers.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::editor::EntryMode;
use crate::models::HealthStatus;
use crate::tui::app::{App, ConfirmTag, Popup};
use crate::tui::ui::{C_BORDER, C_DANGER, C_DIM, C_GOLD, C_OK};

pub fn health_color(status: Option<HealthStatus>) -> Color {
    match status {
        Some(HealthStatus::Healthy)   => C_OK,
        Some(HealthStatus::Degraded)  => C_GOLD,
        Some(HealthStatus::Unhealthy) => C_DANGER,
        None                          => C_DIM,
    }
}

// ── Render ────────────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let draft = app.session.draft();
    let header = Row::new(
        ["Name", "Protocol", "Port", "Policies", "Rules", "Pools", "Health"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD))),
    ).height(1);

    let rows: Vec<Row> = draft.listeners.iter().map(|l| {
        let health = l.health();
        let health_label = match health {
            Some(h) => format!("● {}", h.as_str()),
            None => "-".into(),
        };
        let name = if l.name.is_empty() { "(unnamed)".to_string() } else { l.name.clone() };
        Row::new(vec![
            Cell::from(name),
            Cell::from(l.protocol_str()),
            Cell::from(l.port.to_string()),
            Cell::from(l.policies.len().to_string()),
            Cell::from(l.rules.len().to_string()),
            Cell::from(l.pools.len().to_string()),
            Cell::from(health_label).style(Style::default().fg(health_color(health))),
        ]).height(1)
    }).collect();

    let widths = [
        Constraint::Percentage(30),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(14),
    ];

    let title = format!(" {} Listeners ({}) ", draft.lb_type.as_str().to_uppercase(), draft.listeners.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(C_BORDER))
                .title(title)
                .title_style(Style::default().fg(C_BORDER).add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(
            Style::default().bg(Color::DarkGray).fg(Color::White).add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if !draft.listeners.is_empty() {
        state.select(Some(app.listener_selected));
    }
    f.render_stateful_widget(table, area, &mut state);
}

// ── Key handling ──────────────────────────────────────────────────────────────

pub fn handle_key(app: &mut App, key: KeyEvent) {
    let count = app.session.draft().listeners.len();
    match key.code {
        KeyCode::Up   | KeyCode::Char('k') => { if app.listener_selected > 0 { app.listener_selected -= 1; } }
        KeyCode::Down | KeyCode::Char('j') => { if app.listener_selected + 1 < count { app.listener_selected += 1; } }
        KeyCode::Char('g') => { app.listener_selected = 0; }
        KeyCode::Char('G') => { app.listener_selected = count.saturating_sub(1); }
        KeyCode::Char('b') | KeyCode::Left => { app.session.back(); }
        KeyCode::Char('a') => {
            app.editor_selected = 0;
            if let Err(e) = app.session.add_listener() {
                app.report("Cannot add listener", e);
            }
        }
        KeyCode::Enter | KeyCode::Char('v') => open_selected(app, EntryMode::View),
        KeyCode::Char('e') => open_selected(app, EntryMode::Edit),
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(l) = app.session.draft().listeners.get(app.listener_selected) {
                let name = if l.name.is_empty() { "this listener" } else { l.name.as_str() };
                app.popup = Popup::Confirm {
                    message: format!("Remove '{}'?", name),
                    tag: ConfirmTag::RemoveListener(app.listener_selected),
                    selected_yes: false,
                };
            }
        }
        KeyCode::Char('s') => {
            let draft = app.session.draft();
            app.popup = Popup::Confirm {
                message: format!(
                    "{} '{}' with {} listener(s)?",
                    if app.session.mode().is_edit() { "Update" } else { "Create" },
                    draft.name,
                    draft.listeners.len()
                ),
                tag: ConfirmTag::Submit,
                selected_yes: false,
            };
        }
        _ => {}
    }
}

fn open_selected(app: &mut App, mode: EntryMode) {
    let Some(id) = app.session.draft().listeners.get(app.listener_selected).map(|l| l.id.clone()) else {
        return;
    };
    app.editor_selected = 0;
    if let Err(e) = app.session.open_listener(&id, mode) {
        app.report("Cannot open listener", e);
    }
}

pub fn handle_confirm(app: &mut App, tag: ConfirmTag, confirmed: bool) {
    if !confirmed { return; }
    match tag {
        ConfirmTag::RemoveListener(index) => {
            let Some(id) = app.session.draft().listeners.get(index).map(|l| l.id.clone()) else { return };
            if app.session.remove_listener(&id) {
                let count = app.session.draft().listeners.len();
                app.listener_selected = app.listener_selected.min(count.saturating_sub(1));
            }
            app.drain_events();
        }
        ConfirmTag::Submit => app.submit(),
        _ => {}
    }
}
