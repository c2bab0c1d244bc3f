//! Top-level UI rendering: frame layout, header, step tabs, status bar, popups.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use super::app::{App, ConfirmTag, Popup};
use super::pages;
use super::pages::listeners::health_color;
use crate::draft::{Severity, Step};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BORDER: Color = Color::Cyan;
pub const C_GOLD:   Color = Color::Yellow;
pub const C_OK:     Color = Color::Green;
pub const C_DANGER: Color = Color::Red;
pub const C_DIM:    Color = Color::DarkGray;
pub const C_TEXT:   Color = Color::White;

// ── Spinner frames ────────────────────────────────────────────────────────────

const SPINNER: &[char] = &['⠋','⠙','⠹','⠸','⠼','⠴','⠦','⠧','⠇','⠏'];

pub fn spinner_char(tick: u8) -> char {
    SPINNER[(tick as usize) % SPINNER.len()]
}

// ── Top-level render ──────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_BORDER));
    f.render_widget(outer_block, area);

    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };

    let vchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // header
            Constraint::Length(2),  // steps
            Constraint::Min(1),     // body
            Constraint::Length(1),  // status bar
        ])
        .split(inner);

    render_header(f, app, vchunks[0]);
    render_steps(f, app, vchunks[1]);
    render_body(f, app, vchunks[2]);
    render_status_bar(f, app, vchunks[3]);

    if app.session.editor().is_open() {
        pages::editor::render(f, app, centered_rect(90, vchunks[2].height.saturating_sub(2).max(10), area));
    }
    if app.session.is_submitting() {
        render_loading(f, app, area);
    }
    render_popup(f, app, area);
}

// ── Header ────────────────────────────────────────────────────────────────────

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let hchunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let draft = app.session.draft();
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            " lbdraft",
            Style::default().fg(C_BORDER).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {} configuration draft", draft.lb_type.label()),
            Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            if draft.name.is_empty() { " (unnamed)".to_string() } else { format!(" {}", draft.name) },
            Style::default().fg(C_TEXT),
        )),
    ]);
    f.render_widget(title, hchunks[0]);

    let mode = match app.session.mode().resource_id() {
        Some(id) => format!("Edit {}", id),
        None => "Create".to_string(),
    };
    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Mode:      ", Style::default().fg(C_DIM)),
            Span::styled(mode, Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("Region:    ", Style::default().fg(C_DIM)),
            Span::styled(
                if draft.region.is_empty() { "-" } else { draft.region.as_str() },
                Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Listeners: ", Style::default().fg(C_DIM)),
            Span::styled(draft.listeners.len().to_string(), Style::default().fg(C_TEXT)),
            Span::styled("  Draft: ", Style::default().fg(C_DIM)),
            Span::styled(app.session.key().to_string(), Style::default().fg(C_TEXT)),
        ]),
        Line::from(vec![
            Span::styled("Storage:   ", Style::default().fg(C_DIM)),
            Span::styled(app.storage_label.as_str(), Style::default().fg(C_DIM)),
        ]),
    ]).alignment(Alignment::Right);
    f.render_widget(info, hchunks[1]);
}

// ── Steps ─────────────────────────────────────────────────────────────────────

fn render_steps(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Step::titles().iter().map(|t| Line::from(Span::raw(*t))).collect();

    let tabs = Tabs::new(titles)
        .select(app.session.step().index())
        .highlight_style(
            Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD).add_modifier(Modifier::UNDERLINED),
        )
        .style(Style::default().fg(C_DIM))
        .divider(Span::styled(" │ ", Style::default().fg(C_DIM)));

    let tabs_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(C_DIM));
    f.render_widget(tabs_block, area);

    let tabs_inner = Rect { x: area.x + 2, y: area.y, width: area.width.saturating_sub(2), height: area.height };
    f.render_widget(tabs, tabs_inner);
}

// ── Body ──────────────────────────────────────────────────────────────────────

fn render_body(f: &mut Frame, app: &App, area: Rect) {
    match app.session.step() {
        Step::Basics    => pages::basics::render(f, app, area),
        Step::Listeners => pages::listeners::render(f, app, area),
    }
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let hints = if app.session.editor().is_open() {
        " Listener editor  [?] Help"
    } else {
        match app.session.step() {
            Step::Basics    => " [j/k] Navigate  [Enter] Edit field  [n/Tab] Next step  [C] Discard draft  [?] Help  [q] Quit",
            Step::Listeners => " [a] Add  [Enter] View  [e] Edit  [d] Remove  [s] Submit  [b] Back  [C] Discard  [?] Help  [q] Quit",
        }
    };

    let text = if let Some(ref msg) = app.status_msg {
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(C_GOLD)),
            Span::styled(msg.as_str(), Style::default().fg(C_TEXT)),
        ])
    } else {
        Line::from(Span::styled(hints, Style::default().fg(C_DIM)))
    };

    f.render_widget(Paragraph::new(text), area);
}

// ── Provisioning overlay ──────────────────────────────────────────────────────

fn render_loading(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(60, 5, area);
    f.render_widget(Clear, popup_area);

    let draft = app.session.draft();
    let verb = if app.session.mode().is_edit() { "Updating" } else { "Creating" };
    let lines = vec![
        Line::from(Span::styled(
            format!("{} {} {}", verb, draft.lb_type.as_str(), draft.name),
            Style::default().fg(C_TEXT).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(format!("{} ", spinner_char(app.spinner_tick)), Style::default().fg(C_GOLD)),
            Span::styled(app.loading_message.as_str(), Style::default().fg(C_GOLD)),
        ]),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .title(" Provisioning ")
            .title_style(Style::default().fg(C_BORDER).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(C_BORDER)),
    );
    f.render_widget(p, popup_area);
}

// ── Popups ────────────────────────────────────────────────────────────────────

fn render_popup(f: &mut Frame, app: &App, area: Rect) {
    match &app.popup {
        Popup::None => {}
        Popup::Help => render_help(f, area),
        Popup::Input { title, placeholder, value, .. } => {
            render_input_popup(f, area, title, placeholder, value);
        }
        Popup::Select { title, items, selected, .. } => {
            render_select_popup(f, area, title, items, *selected);
        }
        Popup::Confirm { message, tag, selected_yes } => {
            render_confirm(f, app, area, message, *tag, *selected_yes);
        }
        Popup::Result { title, body, severity } => {
            render_result(f, area, title, body, *severity);
        }
    }
}

fn severity_style(severity: Severity) -> (Color, &'static str) {
    match severity {
        Severity::Info    => (C_BORDER, "i"),
        Severity::Success => (C_OK, "✓"),
        Severity::Warning => (C_GOLD, "!"),
        Severity::Error   => (C_DANGER, "✗"),
    }
}

fn render_input_popup(f: &mut Frame, area: Rect, title: &str, placeholder: &str, value: &str) {
    let popup_area = centered_rect(60, 6, area);
    f.render_widget(Clear, popup_area);

    let field = if value.is_empty() {
        Line::from(vec![
            Span::styled(" ▏", Style::default().fg(C_GOLD)),
            Span::styled(placeholder, Style::default().fg(C_DIM)),
        ])
    } else {
        Line::from(vec![
            Span::styled(format!(" {}", value), Style::default().fg(C_TEXT)),
            Span::styled("▏", Style::default().fg(C_GOLD)),
        ])
    };

    let lines = vec![
        Line::from(""),
        field,
        Line::from(""),
        Line::from(Span::styled(" [Enter] Apply  [Esc] Keep current value", Style::default().fg(C_DIM))),
    ];

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" {} ", title))
            .title_style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(C_BORDER)),
    );
    f.render_widget(p, popup_area);
}

fn render_confirm(
    f: &mut Frame,
    app: &App,
    area: Rect,
    message: &str,
    tag: ConfirmTag,
    selected_yes: bool,
) {
    let (action, accent) = match tag {
        ConfirmTag::Submit if app.session.mode().is_edit() => ("Update", C_OK),
        ConfirmTag::Submit => ("Create", C_OK),
        ConfirmTag::DiscardDraft => ("Discard", C_DANGER),
        ConfirmTag::RemoveListener(_) | ConfirmTag::RemoveEntity(_) => ("Remove", C_DANGER),
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {}", message), Style::default().fg(C_TEXT))),
    ];
    if tag == ConfirmTag::Submit {
        lines.push(Line::from(""));
        lines.extend(review_lines(app));
    }

    let cancel_style = if !selected_yes {
        Style::default().fg(Color::Black).bg(C_GOLD)
    } else {
        Style::default().fg(C_DIM)
    };
    let action_style = if selected_yes {
        Style::default().fg(Color::Black).bg(accent)
    } else {
        Style::default().fg(C_DIM)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled("  [ Cancel ]  ", cancel_style),
        Span::raw("   "),
        Span::styled(format!("  [ {} ]  ", action), action_style),
    ]));
    lines.push(Line::from(Span::styled(
        " [Tab/←/→] Toggle  [Enter] Confirm  [Esc] Back",
        Style::default().fg(C_DIM),
    )));

    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_area = centered_rect(60, height, area);
    f.render_widget(Clear, popup_area);

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" {} ", action))
            .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent)),
    );
    f.render_widget(p, popup_area);
}

/// Draft summary shown before submission: placement, then one line per
/// listener with the worst pool health.
fn review_lines(app: &App) -> Vec<Line<'static>> {
    let draft = app.session.draft();
    let mut lines = vec![Line::from(vec![
        Span::styled("  Placement  ", Style::default().fg(C_DIM)),
        Span::styled(
            format!("{} / {} / {}", draft.region, draft.vpc, draft.subnet),
            Style::default().fg(C_TEXT),
        ),
    ])];

    for l in &draft.listeners {
        let name = if l.name.is_empty() { "(unnamed)".to_string() } else { l.name.clone() };
        let (mark, status, color) = if !l.is_complete() {
            ("◌", "incomplete".to_string(), C_DIM)
        } else {
            match l.health() {
                Some(h) => ("●", h.as_str().to_string(), health_color(Some(h))),
                None => ("●", "no target health".to_string(), C_DIM),
            }
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", mark), Style::default().fg(color)),
            Span::styled(
                format!("{:<18} {:<5} {:<6}", name, l.protocol_str(), l.port),
                Style::default().fg(C_TEXT),
            ),
            Span::styled(status, Style::default().fg(color)),
        ]));
    }
    lines
}

fn render_result(f: &mut Frame, area: Rect, title: &str, body: &str, severity: Severity) {
    let (color, glyph) = severity_style(severity);
    let lines: Vec<Line> = body.lines().map(|l| Line::from(format!(" {}", l))).collect();
    let height = (lines.len() as u16 + 5).min(area.height.saturating_sub(4));
    let popup_area = centered_rect(65, height, area);
    f.render_widget(Clear, popup_area);

    let mut content = vec![Line::from("")];
    content.extend(lines);
    content.push(Line::from(""));
    content.push(Line::from(Span::styled(" [Enter/Esc] Close", Style::default().fg(C_DIM))));

    let p = Paragraph::new(content)
        .style(Style::default().fg(C_TEXT))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!(" {} {} ", glyph, title))
                .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(p, popup_area);
}

fn render_select_popup(f: &mut Frame, area: Rect, title: &str, items: &[String], selected: usize) {
    const VISIBLE: u16 = 12;
    let height = ((items.len() as u16).min(VISIBLE) + 2).max(5);
    let popup_area = centered_rect(50, height, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ({}/{}) ", title, selected + 1, items.len()))
        .title_style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD))
        .title_bottom(Line::from(Span::styled(
            " [j/k] Move  [Enter] Pick  [Esc] Cancel ",
            Style::default().fg(C_DIM),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_BORDER));

    let list = List::new(items.iter().map(|i| ListItem::new(i.as_str())))
        .style(Style::default().fg(C_TEXT))
        .highlight_style(Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD))
        .highlight_symbol("▸ ")
        .block(block);
    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, popup_area, &mut state);
}

fn render_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 33, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(""),
        section_line("Global"),
        key_line("Tab / Shift+Tab", "Next / previous step"),
        key_line("C",               "Discard the draft and exit"),
        key_line("q / Ctrl+c",      "Quit (edit drafts are kept)"),
        key_line("?",               "Toggle this help"),
        Line::from(""),
        section_line("Basics"),
        key_line("j/k or Up/Down",  "Navigate fields"),
        key_line("Enter / e",       "Edit or pick a value"),
        key_line("n / Right",       "Continue to listeners"),
        Line::from(""),
        section_line("Listeners"),
        key_line("a",               "Add a listener"),
        key_line("Enter / v",       "View listener and its targets"),
        key_line("e",               "Edit listener"),
        key_line("d / Del",         "Remove listener"),
        key_line("s",               "Review and submit"),
        key_line("b / Left",        "Back to basics"),
        Line::from(""),
        section_line("Listener editor"),
        key_line("e",               "Start editing (view mode)"),
        key_line("Enter",           "Change the selected field"),
        key_line("p / r / o",       "Add policy / rule / pool"),
        key_line("x / Del",         "Remove policy, rule or pool"),
        key_line("Ctrl+s / S",      "Save listener"),
        key_line("Esc",             "Cancel or close"),
        Line::from(""),
        Line::from(Span::styled("  [Esc / ?] Close", Style::default().fg(C_DIM))),
    ];

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(" Help ")
            .title_style(Style::default().fg(C_BORDER).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(C_BORDER)),
    );
    f.render_widget(p, popup_area);
}

fn section_line(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {} ", title),
        Style::default().fg(C_GOLD).add_modifier(Modifier::BOLD),
    ))
}

fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<22}", key), Style::default().fg(C_TEXT)),
        Span::styled(desc, Style::default().fg(C_DIM)),
    ])
}

// ── Layout helpers ────────────────────────────────────────────────────────────

pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vl = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Length(height),
            Constraint::Percentage(20),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vl[1])[1]
}
