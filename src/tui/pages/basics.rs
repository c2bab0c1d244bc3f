//! Basics step: name, type and network placement.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::directory;
use crate::draft::ValidationError;
use crate::models::LbType;
use crate::patch::BasicsField;
use crate::tui::app::{App, InputTag, Popup};
use crate::tui::ui::{C_BORDER, C_DANGER, C_DIM, C_GOLD, C_OK, C_TEXT};

// ── Render ────────────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_fields(f, app, chunks[0]);
    render_details(f, app, chunks[1]);
}

fn render_fields(f: &mut Frame, app: &App, area: Rect) {
    let draft = app.session.draft();
    let header = Row::new(vec![
        Cell::from("Field").style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD)),
        Cell::from("Value").style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD)),
    ]).height(1);

    let rows: Vec<Row> = BasicsField::all().iter().map(|field| {
        let value = field.value(draft);
        let label = if field.is_required() {
            format!("{} *", field.label())
        } else {
            field.label().to_string()
        };
        let value_cell = if value.trim().is_empty() {
            let style = if field.is_required() { C_DANGER } else { C_DIM };
            Cell::from("(not set)").style(Style::default().fg(style))
        } else {
            Cell::from(value).style(Style::default().fg(C_TEXT))
        };
        Row::new(vec![Cell::from(label), value_cell]).height(1)
    }).collect();

    let table = Table::new(rows, [Constraint::Length(20), Constraint::Min(10)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(C_BORDER))
                .title(" Basics ")
                .title_style(Style::default().fg(C_BORDER).add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(
            Style::default().bg(Color::DarkGray).fg(Color::White).add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    state.select(Some(app.basics_selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let draft = app.session.draft();
    let mut lines = vec![Line::from("")];

    match directory::find_vpc(&draft.vpc) {
        Some(vpc) => {
            lines.push(Line::from(vec![
                Span::styled("  VPC:     ", Style::default().fg(C_DIM)),
                Span::styled(format!("{} ({})", vpc.name, vpc.cidr), Style::default().fg(C_TEXT)),
            ]));
        }
        None if !draft.vpc.is_empty() => {
            lines.push(Line::from(Span::styled(
                format!("  VPC {} is not in the directory", draft.vpc),
                Style::default().fg(C_DANGER),
            )));
        }
        None => {}
    }
    if let Some(subnet) = directory::subnets_in(&draft.vpc).into_iter().find(|s| s.id == draft.subnet) {
        lines.push(Line::from(vec![
            Span::styled("  Subnet:  ", Style::default().fg(C_DIM)),
            Span::styled(format!("{} {} ({})", subnet.name, subnet.zone, subnet.cidr), Style::default().fg(C_TEXT)),
        ]));
    }
    if let Some(tier) = directory::performance_tiers().iter().find(|t| t.id == draft.performance_tier) {
        lines.push(Line::from(vec![
            Span::styled("  Tier:    ", Style::default().fg(C_DIM)),
            Span::styled(format!("{}: {}", tier.label, tier.description), Style::default().fg(C_TEXT)),
        ]));
    }

    let missing: Vec<&str> = BasicsField::all()
        .iter()
        .filter(|f| f.is_required() && f.value(draft).trim().is_empty())
        .map(|f| f.label())
        .collect();
    lines.push(Line::from(""));
    if missing.is_empty() {
        lines.push(Line::from(Span::styled("  Ready for listeners  [n] Next", Style::default().fg(C_OK))));
    } else {
        lines.push(Line::from(Span::styled(
            format!("  Missing: {}", missing.join(", ")),
            Style::default().fg(C_GOLD),
        )));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(C_DIM))
            .title(" Placement ")
            .title_style(Style::default().fg(C_DIM)),
    );
    f.render_widget(p, area);
}

// ── Key handling ──────────────────────────────────────────────────────────────

pub fn handle_key(app: &mut App, key: KeyEvent) {
    let count = BasicsField::all().len();
    match key.code {
        KeyCode::Up   | KeyCode::Char('k') => { if app.basics_selected > 0 { app.basics_selected -= 1; } }
        KeyCode::Down | KeyCode::Char('j') => { if app.basics_selected + 1 < count { app.basics_selected += 1; } }
        KeyCode::Char('g') => { app.basics_selected = 0; }
        KeyCode::Char('G') => { app.basics_selected = count - 1; }
        KeyCode::Enter | KeyCode::Char('e') => edit_field(app),
        KeyCode::Char('n') | KeyCode::Right => {
            let _ = app.session.advance();
            app.drain_events();
        }
        _ => {}
    }
}

/// Directory-backed choices for a field; `None` means free text.
fn choices(app: &App, field: BasicsField) -> Option<Vec<String>> {
    let draft = app.session.draft();
    let list = match field {
        BasicsField::Type => LbType::all().iter().map(|t| t.as_str().to_string()).collect(),
        BasicsField::Region => directory::REGIONS.iter().map(|r| r.to_string()).collect(),
        BasicsField::Vpc => directory::vpcs_in(&draft.region).iter().map(|v| v.id.to_string()).collect(),
        BasicsField::Subnet => directory::subnets_in(&draft.vpc).iter().map(|s| s.id.to_string()).collect(),
        BasicsField::SecurityGroup => {
            directory::security_groups_in(&draft.vpc).iter().map(|g| g.id.to_string()).collect()
        }
        BasicsField::PerformanceTier => {
            directory::performance_tiers().iter().map(|t| t.id.to_string()).collect()
        }
        BasicsField::Name | BasicsField::Description => return None,
    };
    Some(list)
}

fn edit_field(app: &mut App) {
    let Some(&field) = BasicsField::all().get(app.basics_selected) else { return };
    if field == BasicsField::Type && app.session.mode().is_edit() {
        app.status_msg = Some(ValidationError::TypeLocked.to_string());
        return;
    }
    let current = field.value(app.session.draft());
    app.popup = match choices(app, field) {
        Some(items) if !items.is_empty() => {
            let selected = items.iter().position(|i| *i == current).unwrap_or(0);
            Popup::Select { title: field.label().into(), items, selected, tag: InputTag::Basics(field) }
        }
        Some(_) => {
            app.status_msg = Some(format!("No {} available for this selection", field.label()));
            return;
        }
        None => Popup::Input {
            title: field.label().into(),
            placeholder: format!("Enter {}", field.label().to_lowercase()),
            value: current,
            tag: InputTag::Basics(field),
        },
    };
}

pub fn handle_input(app: &mut App, field: BasicsField, value: String) {
    match field.to_patch(&value) {
        Ok(patch) => {
            if app.session.update_basics(patch) {
                app.status_msg = Some(format!("{} updated", field.label()));
            }
            app.drain_events();
        }
        Err(e) => app.report("Invalid value", e),
    }
}
