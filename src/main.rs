//! lbdraft: load balancer listener configuration drafts
//!
//! No args  → TUI mode (ratatui full-screen) creating an ALB
//! With args → non-interactive CLI over the same draft store

mod config;
mod directory;
mod draft;
mod editor;
mod error;
mod inventory;
mod models;
mod patch;
mod provision;
mod registry;
mod storage;
mod tui;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::draft::{DraftSession, FormMode};
use crate::models::{LbType, LoadBalancerDraft};
use crate::registry::TargetGroupRegistry;
use crate::storage::{DraftRepository, FileRepository, MemoryRepository, StorageKey};
use crate::tui::app::{App, ConfirmTag, InputTag, Popup};
use crate::tui::pages;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lbdraft", about = "Load balancer listener configuration drafts", version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "LBDRAFT_CONFIG")]
    config: Option<PathBuf>,
    /// Directory where drafts are stored
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,
    /// Log file used in TUI mode
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Keep drafts in memory only; nothing is written to the storage dir
    #[arg(long, global = true)]
    ephemeral: bool,
    /// Increase CLI log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Author a new load balancer in the TUI
    New {
        /// Load balancer type: "alb" or "nlb"
        #[arg(long = "type", default_value = "alb", value_parser = parse_lb_type)]
        lb_type: LbType,
    },
    /// Edit an existing load balancer in the TUI, resuming any stored draft
    Edit {
        id: String,
    },
    #[command(flatten)]
    Query(QueryCmd),
}

/// Non-interactive commands.
#[derive(Subcommand)]
enum QueryCmd {
    /// List existing load balancers
    List,
    /// Show the configuration of a load balancer (stored draft if present)
    Show {
        id: String,
    },
    /// List target groups, or the members of one
    Targets {
        name: Option<String>,
    },
    /// List stored drafts
    Drafts,
    /// Delete the stored draft of a load balancer
    Discard {
        id: String,
    },
}

fn parse_lb_type(s: &str) -> Result<LbType, String> {
    match s.to_lowercase().as_str() {
        "alb" => Ok(LbType::Alb),
        "nlb" => Ok(LbType::Nlb),
        other => LbType::parse(other).ok_or_else(|| format!("unknown type '{}', use 'alb' or 'nlb'", other)),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        None => run_tui(&config, cli.ephemeral, FormMode::Create, LbType::Alb, None),
        Some(Cmd::New { lb_type }) => run_tui(&config, cli.ephemeral, FormMode::Create, lb_type, None),
        Some(Cmd::Edit { id }) => inventory::find(&id)
            .context("cannot edit")
            .and_then(|rec| {
                let lb_type = rec.config.lb_type;
                let mode = FormMode::Edit { resource_id: rec.id.clone() };
                run_tui(&config, cli.ephemeral, mode, lb_type, Some(rec.to_draft()))
            }),
        Some(Cmd::Query(cmd)) => {
            init_cli_tracing(cli.verbose);
            run_cli(&config, cmd)
        }
    };
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load(&path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = dir.clone();
    }
    if let Some(file) = &cli.log_file {
        config.log_file = file.clone();
    }
    Ok(config)
}

fn load_registry(config: &Config) -> anyhow::Result<TargetGroupRegistry> {
    match &config.registry_file {
        Some(path) => TargetGroupRegistry::from_file(path)
            .with_context(|| format!("loading target groups from {}", path.display())),
        None => Ok(TargetGroupRegistry::builtin()),
    }
}

// ── Tracing ───────────────────────────────────────────────────────────────────

/// File logging for TUI mode; the terminal belongs to ratatui. The guard must
/// live until exit so buffered lines are flushed.
fn init_tui_tracing(config: &Config) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lbdraft={}", config.log_level)));

    let log_dir = config.log_file.parent().unwrap_or(std::path::Path::new("/tmp"));
    let _ = std::fs::create_dir_all(log_dir);
    let log_filename = config
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("lbdraft.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true))
        .init();

    guard
}

fn init_cli_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("lbdraft={}", level))),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// ── Non-interactive CLI ───────────────────────────────────────────────────────

fn run_cli(config: &Config, cmd: QueryCmd) -> anyhow::Result<()> {
    let mut repo = FileRepository::new(&config.storage_dir);
    match cmd {
        QueryCmd::List => {
            println!("{:<16} {:<20} {:<5} {:<12} {:<10} {:<9} {}", "ID", "NAME", "TYPE", "REGION", "STATUS", "LISTENERS", "DNS");
            println!("{}", "-".repeat(110));
            for rec in inventory::load_balancers() {
                let key = StorageKey::for_edit(rec.config.lb_type, &rec.id);
                let marker = if repo.load(&key).ok().flatten().is_some() { " *" } else { "" };
                println!(
                    "{:<16} {:<20} {:<5} {:<12} {:<10} {:<9} {}{}",
                    rec.id, rec.config.name, rec.config.lb_type.key_prefix(), rec.config.region,
                    rec.status.as_str(), rec.config.listeners.len(), rec.dns_name, marker,
                );
            }
        }

        QueryCmd::Show { id } => {
            let rec = inventory::find(&id)?;
            let key = StorageKey::for_edit(rec.config.lb_type, &rec.id);
            let (draft, source) = match repo.load(&key) {
                Ok(Some(d)) => (d, "stored draft"),
                Ok(None) => (rec.to_draft(), "inventory"),
                Err(e) => {
                    eprintln!("warning: {}", e);
                    (rec.to_draft(), "inventory")
                }
            };
            let registry = load_registry(config)?;
            print_draft(&rec.id, &draft, source, &registry);
        }

        QueryCmd::Targets { name } => {
            let registry = load_registry(config)?;
            match name {
                None => {
                    println!("{:<26} {:<10} {:<8} {}", "TARGET GROUP", "HEALTH", "HEALTHY", "TOTAL");
                    println!("{}", "-".repeat(56));
                    for g in registry.groups() {
                        let h = registry::health_of(g);
                        println!("{:<26} {:<10} {:<8} {}", g.name, h.status.as_str(), h.healthy, h.total);
                    }
                }
                Some(name) => {
                    let group = registry.require(&name)?;
                    let h = registry::health_of(group);
                    println!("{} ({}, {}/{} healthy)", group.name, h.status.as_str(), h.healthy, h.total);
                    for m in &group.target_members {
                        println!(
                            "  {:<22} {:>15}:{:<5} weight {:<4} {}",
                            m.name, m.ip_address, m.port, m.weight, m.status.as_str()
                        );
                    }
                }
            }
        }

        QueryCmd::Drafts => {
            let keys = repo.keys()?;
            if keys.is_empty() {
                println!("No stored drafts in {}", repo.dir().display());
            }
            for key in keys {
                match repo.load(&key) {
                    Ok(Some(d)) => println!(
                        "{:<28} {:<16} {:<20} {} listener(s)",
                        key.as_str(), key.resource_id().unwrap_or("-"), d.name, d.listeners.len()
                    ),
                    Ok(None) => {}
                    Err(e) => println!("{:<28} unreadable: {}", key.as_str(), e),
                }
            }
        }

        QueryCmd::Discard { id } => {
            let mut removed = false;
            for lb_type in LbType::all() {
                let key = StorageKey::for_edit(*lb_type, &id);
                if repo.load(&key).map(|d| d.is_some()).unwrap_or(true) {
                    repo.clear(&key)?;
                    removed = true;
                }
            }
            if removed {
                println!("Draft for {} discarded.", id);
            } else {
                println!("No stored draft for {}.", id);
            }
        }
    }
    Ok(())
}

fn print_draft(id: &str, d: &LoadBalancerDraft, source: &str, registry: &TargetGroupRegistry) {
    println!("-------------------------------------");
    println!("  ID:          {} ({})", id, source);
    println!("  Name:        {}", d.name);
    println!("  Type:        {}", d.lb_type.label());
    println!("  Region:      {}", d.region);
    println!("  VPC:         {}", d.vpc);
    println!("  Subnet:      {}", d.subnet);
    println!("  Sec. group:  {}", d.security_group);
    println!("  Tier:        {}", d.performance_tier);
    println!("-------------------------------------");
    for l in &d.listeners {
        let l = registry.enrich_listener(l.clone());
        println!("  Listener {} {}:{}", l.name, l.protocol_str(), l.port);
        if let Some(cert) = &l.certificate {
            println!("    certificate  {}", cert);
        }
        for p in &l.policies {
            match &p.redirect_url {
                Some(url) => println!("    policy       {} {} -> {}", p.name, p.action.as_str(), url),
                None => println!("    policy       {} {}", p.name, p.action.as_str()),
            }
        }
        for r in &l.rules {
            let key = r.key.as_deref().map(|k| format!("[{}] ", k)).unwrap_or_default();
            println!("    rule         {} {}{} {}", r.rule_type.as_str(), key, r.comparator.as_str(), r.value);
        }
        for p in &l.pools {
            let health = match (p.target_group_status, p.healthy_targets, p.target_count) {
                (Some(s), Some(h), Some(t)) => format!("{} {}/{}", s.as_str(), h, t),
                _ => "-".into(),
            };
            println!(
                "    pool         {} {} {} -> {} ({})",
                p.name, p.protocol.as_str(), p.algorithm.as_str(), p.target_group, health
            );
        }
    }
}

// ── TUI ───────────────────────────────────────────────────────────────────────

fn run_tui(
    config: &Config,
    ephemeral: bool,
    mode: FormMode,
    lb_type: LbType,
    seed: Option<LoadBalancerDraft>,
) -> anyhow::Result<()> {
    let _guard = init_tui_tracing(config);
    let registry = load_registry(config)?;
    let (repo, storage_label): (Box<dyn DraftRepository>, String) = if ephemeral {
        (Box::new(MemoryRepository::new()), "memory".into())
    } else {
        let repo = FileRepository::new(&config.storage_dir);
        let label = repo.dir().display().to_string();
        (Box::new(repo), label)
    };

    let mut session = DraftSession::open(mode, lb_type, seed, repo, registry);
    if !session.mode().is_edit() && session.draft().region.is_empty() {
        session.update_basics(patch::BasicsPatch::SetRegion(config.default_region.clone()));
    }
    let mut app = App::new(session, config.behavior(), storage_label);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| tui::ui::render(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_global_key(app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick_spinner();
            app.poll_bg();
            last_tick = Instant::now();
        }

        if app.quit { break; }
    }
    Ok(())
}

fn handle_global_key(app: &mut App, key: KeyEvent) {
    // Handle open popup first
    match app.popup.clone() {
        Popup::None => {}

        Popup::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                app.popup = Popup::None;
            }
            return;
        }

        Popup::Input { tag, .. } => {
            match key.code {
                KeyCode::Esc => { app.popup = Popup::None; }
                KeyCode::Enter => {
                    let val = if let Popup::Input { ref value, .. } = app.popup {
                        value.clone()
                    } else { String::new() };
                    app.popup = Popup::None;
                    dispatch_input(app, tag, val);
                }
                KeyCode::Backspace => {
                    if let Popup::Input { ref mut value, .. } = app.popup { value.pop(); }
                }
                KeyCode::Char(c) => {
                    if let Popup::Input { ref mut value, .. } = app.popup { value.push(c); }
                }
                _ => {}
            }
            return;
        }

        Popup::Confirm { tag, selected_yes, .. } => {
            match key.code {
                KeyCode::Esc => { app.popup = Popup::None; }
                KeyCode::Left | KeyCode::Right | KeyCode::Tab
                | KeyCode::Char('h') | KeyCode::Char('l') => {
                    if let Popup::Confirm { ref mut selected_yes, .. } = app.popup {
                        *selected_yes = !*selected_yes;
                    }
                }
                KeyCode::Enter => {
                    app.popup = Popup::None;
                    dispatch_confirm(app, tag, selected_yes);
                }
                _ => {}
            }
            return;
        }

        Popup::Select { tag, .. } => {
            match key.code {
                KeyCode::Esc => { app.popup = Popup::None; }
                KeyCode::Up | KeyCode::Char('k') => {
                    if let Popup::Select { ref mut selected, .. } = app.popup {
                        if *selected > 0 { *selected -= 1; }
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if let Popup::Select { ref mut selected, ref items, .. } = app.popup {
                        if *selected + 1 < items.len() { *selected += 1; }
                    }
                }
                KeyCode::Enter => {
                    let val = if let Popup::Select { ref items, selected, .. } = app.popup {
                        items.get(selected).cloned().unwrap_or_default()
                    } else { String::new() };
                    app.popup = Popup::None;
                    dispatch_input(app, tag, val);
                }
                _ => {}
            }
            return;
        }

        Popup::Result { .. } => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                app.popup = Popup::None;
            }
            return;
        }
    }

    if app.session.is_submitting() {
        return;
    }
    app.status_msg = None;

    if (key.code, key.modifiers) == (KeyCode::Char('c'), KeyModifiers::CONTROL) {
        app.quit = true;
        return;
    }
    if key.code == KeyCode::Char('?') {
        app.popup = Popup::Help;
        return;
    }
    if app.session.editor().is_open() {
        pages::editor::handle_key(app, key);
        return;
    }

    // Global keys (no popup or editor open)
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => {
            app.quit = true;
        }
        (KeyCode::Char('C'), _) => {
            app.popup = Popup::Confirm {
                message: "Discard this draft and exit?".into(),
                tag: ConfirmTag::DiscardDraft,
                selected_yes: false,
            };
        }
        (KeyCode::Tab, KeyModifiers::NONE) => {
            if !app.on_listeners_step() {
                let _ = app.session.advance();
                app.drain_events();
            }
        }
        (KeyCode::BackTab, _) => {
            app.session.back();
        }
        _ => {
            if app.on_listeners_step() {
                pages::listeners::handle_key(app, key);
            } else {
                pages::basics::handle_key(app, key);
            }
        }
    }
}

fn dispatch_input(app: &mut App, tag: InputTag, value: String) {
    match tag {
        InputTag::Basics(field) => pages::basics::handle_input(app, field, value),
        InputTag::Listener(field) => pages::editor::handle_input(app, field, value),
    }
}

fn dispatch_confirm(app: &mut App, tag: ConfirmTag, confirmed: bool) {
    match tag {
        ConfirmTag::RemoveListener(_) | ConfirmTag::Submit => {
            pages::listeners::handle_confirm(app, tag, confirmed);
        }
        ConfirmTag::RemoveEntity(_) => {
            pages::editor::handle_confirm(app, tag, confirmed);
        }
        ConfirmTag::DiscardDraft => {
            if confirmed {
                app.session.cancel();
                app.drain_events();
            }
        }
    }
}
