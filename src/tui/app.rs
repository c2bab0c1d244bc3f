//! Central application state for the TUI.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::draft::{DraftSession, HostEvent, Severity, Step};
use crate::error::AppError;
use crate::patch::{BasicsField, ListenerField};
use crate::provision::{self, Behavior, ProvisionMessage};

// ── Popup / modal ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Popup {
    None,
    Help,
    /// Single-line text input.
    Input { title: String, placeholder: String, value: String, tag: InputTag },
    /// Scrollable list selection.
    Select { title: String, items: Vec<String>, selected: usize, tag: InputTag },
    Confirm { message: String, tag: ConfirmTag, selected_yes: bool },
    /// Outcome or notification text, styled by severity.
    Result { title: String, body: String, severity: Severity },
}

/// Which field an input or select popup writes back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTag {
    Basics(BasicsField),
    Listener(ListenerField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmTag {
    RemoveListener(usize),
    RemoveEntity(ListenerField),
    Submit,
    DiscardDraft,
}

// ── App state ─────────────────────────────────────────────────────────────────

pub struct App {
    pub session: DraftSession,
    pub behavior: Behavior,
    pub storage_label: String,

    // Basics step
    pub basics_selected: usize,

    // Listeners step
    pub listener_selected: usize,

    // Listener editor overlay
    pub editor_selected: usize,

    // Popup / modal
    pub popup: Popup,

    // Provisioning progress
    pub loading_message: String,

    // Spinner
    pub spinner_tick: u8,

    // Background channel
    pub tx: Sender<ProvisionMessage>,
    pub rx: Receiver<ProvisionMessage>,

    pub quit: bool,
    pub status_msg: Option<String>,
}

impl App {
    pub fn new(session: DraftSession, behavior: Behavior, storage_label: String) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session,
            behavior,
            storage_label,
            basics_selected: 0,
            listener_selected: 0,
            editor_selected: 0,
            popup: Popup::None,
            loading_message: String::new(),
            spinner_tick: 0,
            tx,
            rx,
            quit: false,
            status_msg: None,
        }
    }

    /// Show an error in a result popup.
    pub fn report(&mut self, title: &str, err: AppError) {
        self.popup = Popup::Result { title: title.into(), body: err.to_string(), severity: Severity::Error };
    }

    /// Snapshot the draft and hand it to the provisioning thread.
    pub fn submit(&mut self) {
        match self.session.begin_submit() {
            Ok(request) => {
                self.loading_message = "Submitting...".into();
                provision::spawn(request, self.behavior, self.tx.clone());
            }
            Err(_) => self.drain_events(),
        }
    }

    pub fn poll_bg(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                ProvisionMessage::Progress(stage) => {
                    self.loading_message = stage;
                }
                ProvisionMessage::Done(result) => {
                    self.session.finish_submit(result);
                    self.listener_selected = 0;
                    self.basics_selected = 0;
                }
            }
        }
        self.drain_events();
    }

    /// Turn queued session events into status line text and popups.
    pub fn drain_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                HostEvent::Toast(t) => match t.severity {
                    Severity::Info | Severity::Success => {
                        self.status_msg = Some(format!("{}: {}", t.title, t.description));
                    }
                    Severity::Warning | Severity::Error => {
                        self.popup = Popup::Result { title: t.title, body: t.description, severity: t.severity };
                    }
                },
                HostEvent::ListenerSaved(id) => {
                    if let Some(i) = self.session.draft().listeners.iter().position(|l| l.id == id) {
                        self.listener_selected = i;
                    }
                    self.status_msg = Some("Listener saved".into());
                }
                HostEvent::EditorCancelled => {
                    self.editor_selected = 0;
                    self.status_msg = Some("Changes discarded".into());
                }
                HostEvent::StepComplete(draft) => {
                    self.status_msg = Some(format!("Basics for '{}' complete", draft.name));
                }
                HostEvent::Created(id) => {
                    if matches!(self.popup, Popup::None) {
                        self.popup = Popup::Result {
                            title: "Submitted".into(),
                            body: format!("Load balancer {} accepted", id),
                            severity: Severity::Success,
                        };
                    }
                }
                HostEvent::Cancelled => {
                    self.quit = true;
                }
            }
        }
    }

    pub fn on_listeners_step(&self) -> bool {
        self.session.step() == Step::Listeners
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_tick = self.spinner_tick.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::FormMode;
    use crate::models::{LbType, Listener, Protocol};
    use crate::patch::BasicsPatch;
    use crate::registry::TargetGroupRegistry;
    use crate::storage::MemoryRepository;
    use std::time::{Duration, Instant};

    fn app() -> App {
        let session = DraftSession::open(
            FormMode::Create,
            LbType::Alb,
            None,
            Box::new(MemoryRepository::new()),
            TargetGroupRegistry::builtin(),
        );
        let behavior = Behavior { stage_delay: Duration::ZERO, simulate_failure: false };
        App::new(session, behavior, "memory".into())
    }

    #[test]
    fn warning_toast_becomes_popup() {
        let mut app = app();
        assert!(app.session.advance().is_err());
        app.drain_events();
        assert!(matches!(app.popup, Popup::Result { severity: Severity::Warning, .. }));
    }

    #[test]
    fn blocked_submit_does_not_start_loading() {
        let mut app = app();
        app.session.update_basics(BasicsPatch::SetName("x".into()));
        app.submit();
        assert!(!app.session.is_submitting());
        assert!(matches!(app.popup, Popup::Result { .. }));
    }

    #[test]
    fn finished_provisioning_shows_success_popup() {
        let mut app = app();
        for patch in [
            BasicsPatch::SetName("web-lb".into()),
            BasicsPatch::SetRegion("us-east-1".into()),
            BasicsPatch::SetVpc("vpc-0a1b2c3d".into()),
            BasicsPatch::SetSubnet("subnet-01a".into()),
            BasicsPatch::SetSecurityGroup("sg-web-public".into()),
            BasicsPatch::SetPerformanceTier("standard".into()),
        ] {
            assert!(app.session.update_basics(patch));
        }
        let mut listener = Listener::new_for(LbType::Alb);
        listener.name = "web".into();
        listener.protocol = Some(Protocol::Http);
        app.session.save_listener(listener);

        app.submit();
        assert!(app.session.is_submitting());
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.session.is_submitting() && Instant::now() < deadline {
            app.poll_bg();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!app.session.is_submitting());
        assert!(matches!(app.popup, Popup::Result { severity: Severity::Success, .. }));
        assert!(app.session.draft().listeners.is_empty());
    }

    #[test]
    fn cancelled_draft_quits() {
        let mut app = app();
        app.session.cancel();
        app.drain_events();
        assert!(app.quit);
    }
}
