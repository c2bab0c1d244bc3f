//! Listener editor overlay: field list, registered targets and key handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::editor::EditorState;
use crate::models::{Listener, MemberStatus};
use crate::patch::{ListenerField, ListenerPatch};
use crate::tui::app::{App, ConfirmTag, InputTag, Popup};
use crate::tui::pages::listeners::health_color;
use crate::tui::ui::{C_BORDER, C_DANGER, C_DIM, C_GOLD, C_OK, C_TEXT};

fn fields(app: &App) -> Vec<ListenerField> {
    let editor = app.session.editor();
    editor
        .listener()
        .map(|l| ListenerField::fields_for(l, editor.lb_type()))
        .unwrap_or_default()
}

fn is_locked(field: ListenerField, is_new: bool) -> bool {
    !is_new && matches!(field, ListenerField::Protocol | ListenerField::Port)
}

// ── Render ────────────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let editor = app.session.editor();
    let Some(listener) = editor.listener() else { return };

    f.render_widget(Clear, area);
    let (title, border) = match editor.state() {
        EditorState::Viewing => (" Listener ", C_BORDER),
        _ if editor.is_new() => (" New Listener ", C_GOLD),
        _ => (" Edit Listener ", C_GOLD),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .title(title)
        .title_style(Style::default().fg(border).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let vchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if editor.state() == EditorState::Viewing {
        let hchunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(vchunks[0]);
        render_fields(f, app, listener, hchunks[0]);
        render_targets(f, app, listener, hchunks[1]);
    } else {
        render_fields(f, app, listener, vchunks[0]);
    }

    let hints = if editor.state().is_editing() {
        " [j/k] Move  [Enter] Change  [p/r/o] Add policy/rule/pool  [x] Remove  [Ctrl+s] Save  [Esc] Cancel"
    } else {
        " [j/k] Move  [e] Edit  [Esc] Close"
    };
    f.render_widget(Paragraph::new(Span::styled(hints, Style::default().fg(C_DIM))), vchunks[1]);
}

fn render_fields(f: &mut Frame, app: &App, listener: &Listener, area: Rect) {
    let editor = app.session.editor();
    let rows: Vec<Row> = ListenerField::fields_for(listener, editor.lb_type()).into_iter().map(|field| {
        let value = field.value(listener);
        let mut cells = vec![Cell::from(field.label()).style(Style::default().fg(C_DIM))];
        let value_cell = if value.is_empty() {
            Cell::from("(not set)").style(Style::default().fg(C_DIM))
        } else {
            Cell::from(value).style(Style::default().fg(C_TEXT))
        };
        cells.push(value_cell);

        let note = match field {
            _ if is_locked(field, editor.is_new()) && editor.state().is_editing() => {
                Cell::from("locked").style(Style::default().fg(C_DIM))
            }
            ListenerField::PoolTargetGroup(i) => match listener.pools.get(i) {
                Some(pool) => match (pool.target_group_status, pool.healthy_targets, pool.target_count) {
                    (Some(status), Some(healthy), Some(total)) => {
                        Cell::from(format!("{} {}/{}", status.as_str(), healthy, total))
                            .style(Style::default().fg(health_color(Some(status))))
                    }
                    _ => Cell::from(""),
                },
                None => Cell::from(""),
            },
            _ => Cell::from(""),
        };
        cells.push(note);
        Row::new(cells).height(1)
    }).collect();

    let table = Table::new(rows, [Constraint::Length(22), Constraint::Min(10), Constraint::Length(16)])
        .row_highlight_style(
            Style::default().bg(Color::DarkGray).fg(Color::White).add_modifier(Modifier::BOLD),
        );
    let mut state = TableState::default();
    state.select(Some(app.editor_selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_targets(f: &mut Frame, app: &App, listener: &Listener, area: Rect) {
    let targets = app.session.registry().registered_targets(listener);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_DIM))
        .title(" Registered Targets ")
        .title_style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD));

    if targets.is_empty() {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("  No registered targets", Style::default().fg(C_DIM))),
        ]).block(block);
        f.render_widget(p, area);
        return;
    }

    let header = Row::new(
        ["Pool", "Target", "Address", "Weight", "Status"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD))),
    );
    let rows: Vec<Row> = targets.iter().map(|t| {
        let status = match t.member.status {
            MemberStatus::Healthy   => Cell::from("● healthy").style(Style::default().fg(C_OK)),
            MemberStatus::Unhealthy => Cell::from("◌ unhealthy").style(Style::default().fg(C_DANGER)),
        };
        Row::new(vec![
            Cell::from(t.pool.clone()),
            Cell::from(t.member.name.clone()),
            Cell::from(format!("{}:{}", t.member.ip_address, t.member.port)),
            Cell::from(t.member.weight.to_string()),
            status,
        ])
    }).collect();

    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(25),
        Constraint::Length(21),
        Constraint::Length(6),
        Constraint::Length(11),
    ];
    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

// ── Key handling ──────────────────────────────────────────────────────────────

pub fn handle_key(app: &mut App, key: KeyEvent) {
    let count = fields(app).len();
    if app.editor_selected >= count {
        app.editor_selected = count.saturating_sub(1);
    }

    match (key.code, key.modifiers) {
        (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
            if app.editor_selected > 0 { app.editor_selected -= 1; }
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
            if app.editor_selected + 1 < count { app.editor_selected += 1; }
        }
        (KeyCode::Esc, _) => {
            if let Err(e) = app.session.editor_cancel() {
                app.report("Editor", e);
            }
            app.drain_events();
        }
        _ if app.session.editor().state() == EditorState::Viewing => {
            if key.code == KeyCode::Char('e') {
                if let Err(e) = app.session.editor_begin_edit() {
                    app.report("Editor", e);
                }
            }
        }
        (KeyCode::Char('s'), KeyModifiers::CONTROL) | (KeyCode::Char('S'), _) => {
            let _ = app.session.editor_save();
            app.drain_events();
        }
        (KeyCode::Enter, _) => edit_field(app),
        (KeyCode::Char('p'), _) => apply(app, ListenerPatch::AddPolicy),
        (KeyCode::Char('r'), _) => apply(app, ListenerPatch::AddRule),
        (KeyCode::Char('o'), _) => apply(app, ListenerPatch::AddPool),
        (KeyCode::Char('x'), _) | (KeyCode::Delete, _) => {
            let Some(&field) = fields(app).get(app.editor_selected) else { return };
            if removal_for(app, field).is_some() {
                app.popup = Popup::Confirm {
                    message: format!("Remove {}?", entity_label(field)),
                    tag: ConfirmTag::RemoveEntity(field),
                    selected_yes: false,
                };
            }
        }
        _ => {}
    }
}

fn apply(app: &mut App, patch: ListenerPatch) {
    if let Err(e) = app.session.editor_apply(patch) {
        app.report("Not allowed", e.into());
    }
}

fn entity_label(field: ListenerField) -> String {
    use ListenerField::*;
    match field {
        PolicyName(i) | PolicyAction(i) | PolicyRedirect(i) => format!("policy {}", i + 1),
        RuleType(i) | RuleComparator(i) | RuleValue(i) | RuleKey(i) => format!("rule {}", i + 1),
        PoolName(i) | PoolProtocol(i) | PoolAlgorithm(i) | PoolTargetGroup(i) => format!("pool {}", i + 1),
        _ => "field".into(),
    }
}

/// Remove patch for the policy, rule or pool the cursor sits on.
fn removal_for(app: &App, field: ListenerField) -> Option<ListenerPatch> {
    use ListenerField::*;
    let l = app.session.editor().listener()?;
    match field {
        PolicyName(i) | PolicyAction(i) | PolicyRedirect(i) => {
            l.policies.get(i).map(|p| ListenerPatch::RemovePolicy(p.id.clone()))
        }
        RuleType(i) | RuleComparator(i) | RuleValue(i) | RuleKey(i) => {
            l.rules.get(i).map(|r| ListenerPatch::RemoveRule(r.id.clone()))
        }
        PoolName(i) | PoolProtocol(i) | PoolAlgorithm(i) | PoolTargetGroup(i) => {
            l.pools.get(i).map(|p| ListenerPatch::RemovePool(p.id.clone()))
        }
        Name | Protocol | Port | Certificate => None,
    }
}

fn edit_field(app: &mut App) {
    let Some(&field) = fields(app).get(app.editor_selected) else { return };
    let editor = app.session.editor();
    if is_locked(field, editor.is_new()) {
        app.status_msg = Some(format!("{} cannot change on an existing listener", field.label()));
        return;
    }
    let Some(listener) = editor.listener() else { return };
    let current = field.value(listener);

    let items = match field {
        ListenerField::PoolTargetGroup(_) => Some(app.session.registry().names()),
        _ => field.choices(editor.lb_type()),
    };
    app.popup = match items {
        Some(items) if !items.is_empty() => {
            let selected = items.iter().position(|i| *i == current).unwrap_or(0);
            Popup::Select { title: field.label(), items, selected, tag: InputTag::Listener(field) }
        }
        _ => Popup::Input {
            title: field.label(),
            placeholder: format!("Enter {}", field.label().to_lowercase()),
            value: current,
            tag: InputTag::Listener(field),
        },
    };
}

pub fn handle_input(app: &mut App, field: ListenerField, value: String) {
    let Some(listener) = app.session.editor().listener() else { return };
    match field.to_patch(listener, &value) {
        Ok(patch) => apply(app, patch),
        Err(e) => app.report("Invalid value", e),
    }
}

pub fn handle_confirm(app: &mut App, tag: ConfirmTag, confirmed: bool) {
    if !confirmed { return; }
    if let ConfirmTag::RemoveEntity(field) = tag {
        if let Some(patch) = removal_for(app, field) {
            apply(app, patch);
        }
    }
}
