//! Listener editor modal.
//!
//! The editor never touches the draft directly: it works on a deep copy of one
//! listener and hands the edited copy back on save. Which way cancel goes
//! depends on how the editor was entered, so the entry context lives in an
//! explicit state rather than in flags:
//!
//! ```text
//! Closed ──OpenView──▶ Viewing ──Edit──▶ EditingFromView
//!   │                    │  ▲                 │
//!   │                 Cancel└──Cancel/Save────┘
//!   │                    ▼
//!   ├──OpenEdit/OpenNew─▶ EditingFresh ──Cancel/Save──▶ Closed
//! ```

use thiserror::Error;
use tracing::debug;

use crate::models::{LbType, Listener, PolicyAction, Protocol};
use crate::patch::{check_redirect_url, ListenerPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Viewing,
    EditingFromView,
    EditingFresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    OpenView,
    OpenEdit,
    OpenNew,
    Edit,
    Cancel,
    Save,
}

impl EditorState {
    /// Transition table. `None` means the event is not valid in this state.
    pub fn on(self, event: EditorEvent) -> Option<EditorState> {
        use EditorEvent::*;
        use EditorState::*;
        match (self, event) {
            (Closed, OpenView)                      => Some(Viewing),
            (Closed, OpenEdit) | (Closed, OpenNew)  => Some(EditingFresh),
            (Viewing, Edit)                         => Some(EditingFromView),
            (Viewing, Cancel)                       => Some(Closed),
            (EditingFromView, Cancel | Save)        => Some(Viewing),
            (EditingFresh, Cancel | Save)           => Some(Closed),
            _ => None,
        }
    }

    pub fn is_editing(self) -> bool {
        matches!(self, Self::EditingFromView | Self::EditingFresh)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed          => "closed",
            Self::Viewing         => "viewing",
            Self::EditingFromView => "editing",
            Self::EditingFresh    => "editing",
        }
    }
}

impl EditorEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenView => "open for viewing",
            Self::OpenEdit => "open for editing",
            Self::OpenNew  => "open a new listener",
            Self::Edit     => "start editing",
            Self::Cancel   => "cancel",
            Self::Save     => "save",
        }
    }
}

/// How a listener row was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    View,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Cannot {} while the editor is {}", .event.as_str(), .state.as_str())]
    InvalidTransition { state: EditorState, event: EditorEvent },
    #[error("Switch to edit mode before changing the listener")]
    ReadOnly,
    #[error("The {0} of an existing listener cannot be changed")]
    Immutable(&'static str),
    #[error("{} is not available on an {}", .protocol.as_str(), .lb_type.as_str())]
    UnsupportedProtocol { protocol: Protocol, lb_type: LbType },
    #[error("Port must be between 1 and 65535")]
    InvalidPort,
    #[error("HTTPS listeners need a certificate")]
    CertificateRequired,
    #[error("Certificates only apply to HTTPS listeners")]
    CertificateNotApplicable,
    #[error("{0} do not apply to this listener")]
    NotApplicable(&'static str),
    #[error("A listener needs at least one {0}")]
    LastEntity(&'static str),
    #[error("No {kind} with id {id}")]
    UnknownEntity { kind: &'static str, id: String },
    #[error("Redirect URL must be an absolute http(s) URL: {0}")]
    InvalidRedirectUrl(String),
    #[error("Redirect policy '{0}' has no redirect URL")]
    MissingRedirectUrl(String),
    #[error("Rule {0} needs a key for its match type")]
    MissingRuleKey(usize),
}

/// Checks run when the editor saves. Presence of name / protocol / port is
/// left to the draft's submit gate.
pub fn validate_listener(listener: &Listener) -> Result<(), EditorError> {
    if listener.protocol.is_some_and(|p| p.terminates_tls())
        && listener.certificate.as_deref().map_or(true, |c| c.trim().is_empty())
    {
        return Err(EditorError::CertificateRequired);
    }
    for policy in &listener.policies {
        if policy.action == PolicyAction::Redirect {
            match policy.redirect_url.as_deref() {
                Some(url) => check_redirect_url(url)?,
                None => return Err(EditorError::MissingRedirectUrl(policy.name.clone())),
            }
        }
    }
    for (i, rule) in listener.rules.iter().enumerate() {
        if rule.rule_type.needs_key() && rule.key.as_deref().map_or(true, str::is_empty) {
            return Err(EditorError::MissingRuleKey(i + 1));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ListenerEditor {
    state: EditorState,
    lb_type: LbType,
    is_new: bool,
    /// The listener being shown or edited. Always a deep copy.
    working: Option<Listener>,
    /// Copy taken when editing began; restored on cancel.
    snapshot: Option<Listener>,
}

impl Default for ListenerEditor {
    fn default() -> Self {
        Self {
            state: EditorState::Closed,
            lb_type: LbType::Alb,
            is_new: false,
            working: None,
            snapshot: None,
        }
    }
}

impl ListenerEditor {
    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != EditorState::Closed
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn lb_type(&self) -> LbType {
        self.lb_type
    }

    pub fn listener(&self) -> Option<&Listener> {
        self.working.as_ref()
    }

    fn step(&mut self, event: EditorEvent) -> Result<EditorState, EditorError> {
        let next = self
            .state
            .on(event)
            .ok_or(EditorError::InvalidTransition { state: self.state, event })?;
        debug!(from = self.state.as_str(), to = next.as_str(), event = event.as_str(), "listener editor transition");
        self.state = next;
        Ok(next)
    }

    /// Open an existing listener.
    pub fn open(&mut self, listener: &Listener, mode: EntryMode, lb_type: LbType) -> Result<(), EditorError> {
        let event = match mode {
            EntryMode::View => EditorEvent::OpenView,
            EntryMode::Edit => EditorEvent::OpenEdit,
        };
        self.step(event)?;
        self.lb_type = lb_type;
        self.is_new = false;
        self.working = Some(listener.clone());
        self.snapshot = Some(listener.clone());
        Ok(())
    }

    /// Open a freshly constructed listener straight into edit mode.
    pub fn open_new(&mut self, listener: Listener, lb_type: LbType) -> Result<(), EditorError> {
        self.step(EditorEvent::OpenNew)?;
        self.lb_type = lb_type;
        self.is_new = true;
        self.snapshot = Some(listener.clone());
        self.working = Some(listener);
        Ok(())
    }

    /// Viewing → editing. The current view becomes the cancel snapshot.
    pub fn begin_edit(&mut self) -> Result<(), EditorError> {
        self.step(EditorEvent::Edit)?;
        self.snapshot = self.working.clone();
        Ok(())
    }

    pub fn apply(&mut self, patch: ListenerPatch) -> Result<(), EditorError> {
        if !self.state.is_editing() {
            return Err(EditorError::ReadOnly);
        }
        if !self.is_new {
            if let Some(field) = patch.locked_field() {
                return Err(EditorError::Immutable(field));
            }
        }
        let lb_type = self.lb_type;
        let listener = self.working.as_mut().ok_or(EditorError::ReadOnly)?;
        listener.apply(lb_type, patch)
    }

    /// Validate and hand back the edited copy. After saving from view mode the
    /// editor stays open in `Viewing`; call [`show_saved`](Self::show_saved)
    /// with the merged listener so the view reflects enrichment.
    pub fn save(&mut self) -> Result<Listener, EditorError> {
        if !self.state.is_editing() {
            return Err(EditorError::InvalidTransition { state: self.state, event: EditorEvent::Save });
        }
        let listener = self.working.clone().ok_or(EditorError::ReadOnly)?;
        validate_listener(&listener)?;
        if self.step(EditorEvent::Save)? == EditorState::Closed {
            self.reset();
        } else {
            self.is_new = false;
        }
        Ok(listener)
    }

    /// Cancel according to how the editor was entered. Edits never leak: the
    /// working copy is dropped or replaced by the snapshot.
    pub fn cancel(&mut self) -> Result<EditorState, EditorError> {
        match self.step(EditorEvent::Cancel)? {
            EditorState::Viewing => {
                self.working = self.snapshot.clone();
                Ok(EditorState::Viewing)
            }
            other => {
                self.reset();
                Ok(other)
            }
        }
    }

    /// Replace the viewed listener with the merged, enriched version.
    pub fn show_saved(&mut self, listener: Listener) {
        if self.state == EditorState::Viewing {
            self.snapshot = Some(listener.clone());
            self.working = Some(listener);
        }
    }

    /// Close unconditionally, discarding any edits.
    pub fn close(&mut self) {
        self.state = EditorState::Closed;
        self.reset();
    }

    fn reset(&mut self) {
        self.is_new = false;
        self.working = None;
        self.snapshot = None;
    }
}
