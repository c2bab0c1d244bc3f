//! Draft store: the single source of truth for the load balancer being
//! authored, its wizard step, the listener editor and the persistence mirror.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::editor::{EditorError, EditorState, EntryMode, ListenerEditor};
use crate::error::Result;
use crate::models::{LbType, Listener, LoadBalancerDraft};
use crate::patch::{BasicsPatch, ListenerPatch};
use crate::registry::TargetGroupRegistry;
use crate::storage::{DraftRepository, StorageKey};

// ── Modes, steps and host-facing events ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { resource_id: String },
}

impl FormMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Edit { .. })
    }

    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Edit { resource_id } => Some(resource_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Basics,
    Listeners,
}

impl Step {
    pub fn titles() -> &'static [&'static str] {
        &["1. Basics", "2. Listeners"]
    }
    pub fn index(self) -> usize {
        match self {
            Self::Basics => 0,
            Self::Listeners => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Toast {
    pub fn new(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), severity }
    }
}

/// Callbacks to the host shell, delivered through an outbox the host drains.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    ListenerSaved(String),
    EditorCancelled,
    StepComplete(LoadBalancerDraft),
    Created(String),
    Cancelled,
    Toast(Toast),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("At least one listener is required")]
    NoListeners,
    #[error("Listener {index} needs a name, protocol and port")]
    IncompleteListener { index: usize },
    #[error("A load balancer must keep at least one listener")]
    LastListener,
    #[error("No listener with id {0}")]
    UnknownListener(String),
    #[error("A submission is already in progress")]
    SubmitInProgress,
    #[error("The type of an existing load balancer cannot change")]
    TypeLocked,
}

/// Presence checks for the Basics step.
pub fn validate_basics(draft: &LoadBalancerDraft) -> std::result::Result<(), ValidationError> {
    let required = [
        ("Name", &draft.name),
        ("Region", &draft.region),
        ("VPC", &draft.vpc),
        ("Subnet", &draft.subnet),
        ("Security group", &draft.security_group),
        ("Performance tier", &draft.performance_tier),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(label));
        }
    }
    Ok(())
}

/// Full gate for "Review & Create": basics present and at least one listener
/// with a name, protocol and port. Incomplete extra listeners do not block.
pub fn validate_for_submit(draft: &LoadBalancerDraft) -> std::result::Result<(), ValidationError> {
    validate_basics(draft)?;
    if draft.listeners.is_empty() {
        return Err(ValidationError::NoListeners);
    }
    if !draft.listeners.iter().any(Listener::is_complete) {
        return Err(ValidationError::IncompleteListener { index: 1 });
    }
    Ok(())
}

// ── Session ───────────────────────────────────────────────────────────────────

/// What a provisioning run needs; produced by [`DraftSession::begin_submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub mode: FormMode,
    pub draft: LoadBalancerDraft,
}

pub struct DraftSession {
    mode: FormMode,
    key: StorageKey,
    draft: LoadBalancerDraft,
    step: Step,
    editor: ListenerEditor,
    repo: Box<dyn DraftRepository>,
    registry: TargetGroupRegistry,
    events: Vec<HostEvent>,
    submitting: bool,
}

impl DraftSession {
    /// Mount a session. Create mode wipes any stale placeholder entry and
    /// starts from defaults. Edit mode resumes a stored draft, falling back to
    /// `seed` (or defaults) when nothing usable is stored.
    pub fn open(
        mode: FormMode,
        lb_type: LbType,
        seed: Option<LoadBalancerDraft>,
        mut repo: Box<dyn DraftRepository>,
        registry: TargetGroupRegistry,
    ) -> Self {
        let (key, draft) = match &mode {
            FormMode::Create => {
                let key = StorageKey::for_create(lb_type);
                if let Err(e) = repo.clear(&key) {
                    warn!(key = %key, error = %e, "could not clear stale create-mode draft");
                }
                (key, LoadBalancerDraft::new(lb_type))
            }
            FormMode::Edit { resource_id } => {
                let key = StorageKey::for_edit(lb_type, resource_id);
                let fallback = || seed.clone().unwrap_or_else(|| LoadBalancerDraft::new(lb_type));
                let draft = match repo.load(&key) {
                    Ok(Some(d)) => {
                        info!(key = %key, "resumed stored draft");
                        d
                    }
                    Ok(None) => fallback(),
                    Err(e) => {
                        warn!(key = %key, error = %e, "discarding unreadable draft");
                        if let Err(e) = repo.clear(&key) {
                            warn!(key = %key, error = %e, "could not remove unreadable draft");
                        }
                        fallback()
                    }
                };
                (key, draft)
            }
        };
        debug!(key = %key, edit = mode.is_edit(), "draft session opened");
        Self {
            mode,
            key,
            draft,
            step: Step::Basics,
            editor: ListenerEditor::default(),
            repo,
            registry,
            events: Vec::new(),
            submitting: false,
        }
    }

    // ── Accessors ──

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }
    pub fn key(&self) -> &StorageKey {
        &self.key
    }
    pub fn draft(&self) -> &LoadBalancerDraft {
        &self.draft
    }
    pub fn step(&self) -> Step {
        self.step
    }
    pub fn editor(&self) -> &ListenerEditor {
        &self.editor
    }
    pub fn registry(&self) -> &TargetGroupRegistry {
        &self.registry
    }
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Hand pending host events over to the caller.
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    fn toast(&mut self, severity: Severity, title: &str, description: impl Into<String>) {
        self.events.push(HostEvent::Toast(Toast::new(severity, title, description)));
    }

    /// Mirror the draft to storage. Edit mode only; failures are logged.
    fn persist(&mut self) {
        if !self.mode.is_edit() {
            return;
        }
        if let Err(e) = self.repo.save(&self.key, &self.draft) {
            warn!(key = %self.key, error = %e, "could not persist draft");
        }
    }

    fn clear_storage(&mut self) {
        if let Err(e) = self.repo.clear(&self.key) {
            warn!(key = %self.key, error = %e, "could not clear stored draft");
        }
    }

    // ── Basics ──

    /// Merge one basics field. Edit mode refuses a type change because the
    /// storage key is derived from the type. Returns whether the patch applied.
    pub fn update_basics(&mut self, patch: BasicsPatch) -> bool {
        if let BasicsPatch::SetType(t) = &patch {
            if self.mode.is_edit() && *t != self.draft.lb_type {
                self.toast(Severity::Warning, "Type locked", ValidationError::TypeLocked.to_string());
                return false;
            }
        }
        self.draft.apply(patch);
        self.persist();
        true
    }

    // ── Wizard ──

    /// Basics → Listeners. Blocked (draft and step untouched) until every
    /// required basics field is filled.
    pub fn advance(&mut self) -> std::result::Result<Step, ValidationError> {
        if self.step == Step::Listeners {
            return Ok(self.step);
        }
        if let Err(e) = validate_basics(&self.draft) {
            self.toast(Severity::Warning, "Missing information", e.to_string());
            return Err(e);
        }
        self.step = Step::Listeners;
        self.events.push(HostEvent::StepComplete(self.draft.clone()));
        Ok(self.step)
    }

    pub fn back(&mut self) -> Step {
        self.step = Step::Basics;
        self.step
    }

    // ── Listeners ──

    /// Build a new listener and open it in the editor. Returns its id.
    pub fn add_listener(&mut self) -> Result<String> {
        let listener = Listener::new_for(self.draft.lb_type);
        let id = listener.id.clone();
        self.editor.open_new(listener, self.draft.lb_type)?;
        Ok(id)
    }

    /// Remove a listener unless it is the last one. Returns whether anything changed.
    pub fn remove_listener(&mut self, id: &str) -> bool {
        if self.draft.listeners.len() <= 1 {
            self.toast(Severity::Warning, "Cannot remove listener", ValidationError::LastListener.to_string());
            return false;
        }
        let before = self.draft.listeners.len();
        self.draft.listeners.retain(|l| l.id != id);
        if self.draft.listeners.len() == before {
            return false;
        }
        if self.editor.listener().is_some_and(|l| l.id == id) {
            self.editor.close();
        }
        info!(listener = id, "listener removed");
        self.persist();
        self.toast(Severity::Info, "Listener removed", format!("{} listener(s) left", self.draft.listeners.len()));
        true
    }

    /// Enrich pool health from the registry, then upsert by id: replace in
    /// place when the id exists, append otherwise. Returns the stored listener.
    pub fn save_listener(&mut self, listener: Listener) -> Listener {
        let listener = self.registry.enrich_listener(listener);
        match self.draft.listeners.iter_mut().find(|l| l.id == listener.id) {
            Some(slot) => *slot = listener.clone(),
            None => self.draft.listeners.push(listener.clone()),
        }
        info!(listener = %listener.id, name = %listener.name, "listener saved");
        self.persist();
        self.events.push(HostEvent::ListenerSaved(listener.id.clone()));
        listener
    }

    // ── Editor ──

    pub fn open_listener(&mut self, id: &str, mode: EntryMode) -> Result<()> {
        let listener = self
            .draft
            .listener(id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownListener(id.to_string()))?;
        self.editor.open(&listener, mode, self.draft.lb_type)?;
        Ok(())
    }

    pub fn editor_begin_edit(&mut self) -> Result<()> {
        self.editor.begin_edit()?;
        Ok(())
    }

    pub fn editor_apply(&mut self, patch: ListenerPatch) -> std::result::Result<(), EditorError> {
        self.editor.apply(patch)
    }

    /// Save the editor's copy into the draft. Enrichment and merge complete
    /// before the editor closes or returns to view mode.
    pub fn editor_save(&mut self) -> Result<Listener> {
        let edited = match self.editor.save() {
            Ok(l) => l,
            Err(e) => {
                self.toast(Severity::Warning, "Listener not saved", e.to_string());
                return Err(e.into());
            }
        };
        let stored = self.save_listener(edited);
        self.editor.show_saved(stored.clone());
        Ok(stored)
    }

    pub fn editor_cancel(&mut self) -> Result<EditorState> {
        let state = self.editor.cancel()?;
        self.events.push(HostEvent::EditorCancelled);
        Ok(state)
    }

    // ── Submission ──

    /// Check the full gate and snapshot the draft for provisioning.
    pub fn begin_submit(&mut self) -> std::result::Result<SubmitRequest, ValidationError> {
        if self.submitting {
            return Err(ValidationError::SubmitInProgress);
        }
        if let Err(e) = validate_for_submit(&self.draft) {
            self.toast(Severity::Warning, "Cannot create load balancer", e.to_string());
            return Err(e);
        }
        self.submitting = true;
        info!(name = %self.draft.name, lb_type = self.draft.lb_type.as_str(), "submission started");
        Ok(SubmitRequest { mode: self.mode.clone(), draft: self.draft.clone() })
    }

    /// Apply the outcome of a provisioning run. Success clears the stored
    /// draft and starts over as a fresh create session, so nothing is
    /// mirrored under the old key again. Failure keeps everything for a retry.
    pub fn finish_submit(&mut self, outcome: Result<String>) {
        self.submitting = false;
        match outcome {
            Ok(id) => {
                let verb = if self.mode.is_edit() { "updated" } else { "created" };
                info!(id = %id, "load balancer {}", verb);
                self.clear_storage();
                self.toast(
                    Severity::Success,
                    &format!("Load balancer {}", verb),
                    format!("{} ({}) is being provisioned", self.draft.name, id),
                );
                let lb_type = self.draft.lb_type;
                self.draft = LoadBalancerDraft::new(lb_type);
                self.mode = FormMode::Create;
                self.key = StorageKey::for_create(lb_type);
                self.step = Step::Basics;
                self.editor.close();
                self.events.push(HostEvent::Created(id));
            }
            Err(e) => {
                warn!(error = %e, "submission failed");
                self.toast(
                    Severity::Error,
                    "Request failed",
                    format!("{}. Your draft was kept; try again.", e),
                );
            }
        }
    }

    /// Abandon the draft: remove its stored copy and notify the host.
    pub fn cancel(&mut self) {
        self.clear_storage();
        self.editor.close();
        self.events.push(HostEvent::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{HealthStatus, Protocol};
    use crate::patch::PoolPatch;
    use crate::storage::MemoryRepository;
    use pretty_assertions::assert_eq;

    fn create_session(repo: &MemoryRepository) -> DraftSession {
        DraftSession::open(
            FormMode::Create,
            LbType::Alb,
            None,
            Box::new(repo.clone()),
            TargetGroupRegistry::builtin(),
        )
    }

    fn edit_session(repo: &MemoryRepository, id: &str, seed: Option<LoadBalancerDraft>) -> DraftSession {
        DraftSession::open(
            FormMode::Edit { resource_id: id.into() },
            LbType::Alb,
            seed,
            Box::new(repo.clone()),
            TargetGroupRegistry::builtin(),
        )
    }

    fn fill_basics(s: &mut DraftSession) {
        s.update_basics(BasicsPatch::SetName("web-lb".into()));
        s.update_basics(BasicsPatch::SetRegion("us-east-1".into()));
        s.update_basics(BasicsPatch::SetVpc("vpc-0a1b2c3d".into()));
        s.update_basics(BasicsPatch::SetSubnet("subnet-01a".into()));
        s.update_basics(BasicsPatch::SetSecurityGroup("sg-web-public".into()));
        s.update_basics(BasicsPatch::SetPerformanceTier("standard".into()));
    }

    fn named_listener(name: &str) -> Listener {
        let mut l = Listener::new_for(LbType::Alb);
        l.name = name.into();
        l.protocol = Some(Protocol::Http);
        l
    }

    #[test]
    fn example_scenario_https_listener_with_degraded_pool() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);

        let id = s.add_listener().unwrap();
        assert_eq!(s.editor().state(), EditorState::EditingFresh);
        assert_eq!(s.editor().listener().unwrap().port, 80);
        assert_eq!(s.editor().listener().unwrap().protocol, None);

        let pool = s.editor().listener().unwrap().pools[0].id.clone();
        s.editor_apply(ListenerPatch::SetName("web".into())).unwrap();
        s.editor_apply(ListenerPatch::SetProtocol(Protocol::Https)).unwrap();
        s.editor_apply(ListenerPatch::SetPort(443)).unwrap();
        s.editor_apply(ListenerPatch::SetCertificate(Some("cert-1".into()))).unwrap();
        s.editor_apply(ListenerPatch::Pool(pool, PoolPatch::SetTargetGroup("production-web-targets".into())))
            .unwrap();
        s.editor_save().unwrap();

        assert!(!s.editor().is_open());
        let listeners = &s.draft().listeners;
        assert_eq!(listeners.len(), 1);
        let l = &listeners[0];
        assert_eq!(l.id, id);
        assert_eq!(l.name, "web");
        assert_eq!(l.port, 443);
        assert_eq!(l.pools[0].target_group_status, Some(HealthStatus::Degraded));
        assert_eq!(l.pools[0].target_count, Some(4));
        assert_eq!(l.pools[0].healthy_targets, Some(3));
        assert!(s.drain_events().contains(&HostEvent::ListenerSaved(id)));
    }

    #[test]
    fn save_upserts_by_id() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        let a = s.save_listener(named_listener("a"));
        let b = s.save_listener(named_listener("b"));
        assert_eq!(s.draft().listeners.len(), 2);

        let mut a2 = a.clone();
        a2.name = "a-renamed".into();
        s.save_listener(a2);
        assert_eq!(s.draft().listeners.len(), 2);
        assert_eq!(s.draft().listeners[0].id, a.id);
        assert_eq!(s.draft().listeners[0].name, "a-renamed");
        assert_eq!(s.draft().listeners[1].id, b.id);

        s.save_listener(named_listener("c"));
        assert_eq!(s.draft().listeners.len(), 3);
    }

    #[test]
    fn cancel_leaves_parent_draft_untouched() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        let saved = s.save_listener(named_listener("web"));
        let before = s.draft().clone();

        s.open_listener(&saved.id, EntryMode::View).unwrap();
        s.editor_begin_edit().unwrap();
        let pool = saved.pools[0].id.clone();
        s.editor_apply(ListenerPatch::SetName("other".into())).unwrap();
        s.editor_apply(ListenerPatch::AddPool).unwrap();
        s.editor_apply(ListenerPatch::Pool(pool, PoolPatch::SetTargetGroup("staging-web-targets".into())))
            .unwrap();
        assert_eq!(s.editor_cancel().unwrap(), EditorState::Viewing);

        assert_eq!(s.draft(), &before);
        assert_eq!(s.editor().listener(), Some(&before.listeners[0]));
        assert!(s.drain_events().contains(&HostEvent::EditorCancelled));
    }

    #[test]
    fn last_listener_cannot_be_removed() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        let only = s.save_listener(named_listener("only"));
        let before = s.draft().clone();
        assert!(!s.remove_listener(&only.id));
        assert_eq!(s.draft(), &before);

        let second = s.save_listener(named_listener("second"));
        assert!(s.remove_listener(&only.id));
        assert_eq!(s.draft().listeners.len(), 1);
        assert_eq!(s.draft().listeners[0].id, second.id);
        assert!(!s.remove_listener("missing"));
    }

    #[test]
    fn removing_the_open_listener_closes_the_editor() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        let a = s.save_listener(named_listener("a"));
        s.save_listener(named_listener("b"));
        s.open_listener(&a.id, EntryMode::View).unwrap();
        assert!(s.remove_listener(&a.id));
        assert!(!s.editor().is_open());
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, HostEvent::Toast(t) if t.severity == Severity::Info)));
    }

    #[test]
    fn step_gate_requires_all_basics() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        s.update_basics(BasicsPatch::SetName("web-lb".into()));
        let before = s.draft().clone();

        assert_eq!(s.advance(), Err(ValidationError::MissingField("Region")));
        assert_eq!(s.step(), Step::Basics);
        assert_eq!(s.draft(), &before);
        assert!(matches!(
            s.drain_events().as_slice(),
            [HostEvent::Toast(Toast { severity: Severity::Warning, .. })]
        ));

        fill_basics(&mut s);
        s.update_basics(BasicsPatch::SetSubnet("   ".into()));
        assert_eq!(s.advance(), Err(ValidationError::MissingField("Subnet")));

        s.update_basics(BasicsPatch::SetSubnet("subnet-01a".into()));
        assert_eq!(s.advance(), Ok(Step::Listeners));
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, HostEvent::StepComplete(d) if d.name == "web-lb")));
        assert_eq!(s.back(), Step::Basics);
    }

    #[test]
    fn submit_gate_checks_listeners() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        fill_basics(&mut s);
        assert_eq!(s.begin_submit(), Err(ValidationError::NoListeners));

        let mut incomplete = named_listener("x");
        incomplete.protocol = None;
        s.save_listener(incomplete);
        assert_eq!(s.begin_submit(), Err(ValidationError::IncompleteListener { index: 1 }));
    }

    #[test]
    fn one_complete_listener_is_enough_to_submit() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        fill_basics(&mut s);
        s.save_listener(named_listener("web"));
        s.save_listener(Listener::new_for(LbType::Alb));
        assert_eq!(s.draft().listeners.len(), 2);

        let req = s.begin_submit().unwrap();
        assert_eq!(req.draft.listeners.len(), 2);
    }

    #[test]
    fn create_mode_never_persists_and_wipes_stale_entry() {
        let repo = MemoryRepository::new();
        let placeholder = StorageKey::for_create(LbType::Alb);
        let mut stale = LoadBalancerDraft::new(LbType::Alb);
        stale.name = "stale".into();
        repo.insert_raw(&placeholder, &serde_json::to_string(&stale).unwrap());

        let mut s = create_session(&repo);
        assert_eq!(s.draft(), &LoadBalancerDraft::new(LbType::Alb));
        assert!(repo.is_empty());

        fill_basics(&mut s);
        s.save_listener(named_listener("web"));
        assert!(repo.is_empty());
    }

    #[test]
    fn edit_mode_round_trips_through_storage() {
        let repo = MemoryRepository::new();
        let mut first = edit_session(&repo, "alb-1", None);
        fill_basics(&mut first);
        first.save_listener(named_listener("web"));
        let written = first.draft().clone();
        assert!(repo.contains(&StorageKey::for_edit(LbType::Alb, "alb-1")));
        drop(first);

        let second = edit_session(&repo, "alb-1", Some(LoadBalancerDraft::new(LbType::Alb)));
        assert_eq!(second.draft(), &written);
    }

    #[test]
    fn edit_mode_starts_from_seed_when_nothing_stored() {
        let repo = MemoryRepository::new();
        let mut seed = LoadBalancerDraft::new(LbType::Alb);
        seed.name = "from-inventory".into();
        let s = edit_session(&repo, "alb-9", Some(seed.clone()));
        assert_eq!(s.draft(), &seed);
    }

    #[test]
    fn corrupt_entry_falls_back_and_is_discarded() {
        let repo = MemoryRepository::new();
        let key = StorageKey::for_edit(LbType::Alb, "alb-1");
        repo.insert_raw(&key, "{ definitely not a draft");
        let mut seed = LoadBalancerDraft::new(LbType::Alb);
        seed.name = "seeded".into();

        let s = edit_session(&repo, "alb-1", Some(seed.clone()));
        assert_eq!(s.draft(), &seed);
        assert!(!repo.contains(&key));
    }

    #[test]
    fn successful_submit_clears_storage_and_resets() {
        let repo = MemoryRepository::new();
        let mut s = edit_session(&repo, "alb-1", None);
        fill_basics(&mut s);
        s.save_listener(named_listener("web"));
        assert!(s.advance().is_ok());
        s.drain_events();

        let req = s.begin_submit().unwrap();
        assert_eq!(req.mode, FormMode::Edit { resource_id: "alb-1".into() });
        assert!(s.is_submitting());
        assert_eq!(s.begin_submit(), Err(ValidationError::SubmitInProgress));

        s.finish_submit(Ok("alb-1".into()));
        assert!(!s.is_submitting());
        assert!(repo.is_empty());
        assert_eq!(s.mode(), &FormMode::Create);
        assert_eq!(s.draft(), &LoadBalancerDraft::new(LbType::Alb));
        assert_eq!(s.step(), Step::Basics);
        let events = s.drain_events();
        assert!(events.contains(&HostEvent::Created("alb-1".into())));
        assert!(events
            .iter()
            .any(|e| matches!(e, HostEvent::Toast(t) if t.severity == Severity::Success)));
    }

    #[test]
    fn edits_after_successful_update_are_not_mirrored() {
        let repo = MemoryRepository::new();
        let mut s = edit_session(&repo, "alb-1", None);
        fill_basics(&mut s);
        s.save_listener(named_listener("web"));
        s.begin_submit().unwrap();
        s.finish_submit(Ok("alb-1".into()));

        s.update_basics(BasicsPatch::SetDescription("x".into()));
        s.save_listener(named_listener("next"));
        assert!(repo.is_empty());

        let mut seed = LoadBalancerDraft::new(LbType::Alb);
        seed.name = "inventory-name".into();
        let reopened = edit_session(&repo, "alb-1", Some(seed.clone()));
        assert_eq!(reopened.draft(), &seed);
    }

    #[test]
    fn edit_mode_refuses_type_change() {
        let repo = MemoryRepository::new();
        let mut s = edit_session(&repo, "alb-1", None);
        fill_basics(&mut s);
        s.drain_events();

        assert!(!s.update_basics(BasicsPatch::SetType(LbType::Nlb)));
        assert_eq!(s.draft().lb_type, LbType::Alb);
        assert_eq!(s.key(), &StorageKey::for_edit(LbType::Alb, "alb-1"));
        assert!(matches!(
            s.drain_events().as_slice(),
            [HostEvent::Toast(Toast { severity: Severity::Warning, .. })]
        ));
        assert!(s.update_basics(BasicsPatch::SetType(LbType::Alb)));

        let mut created = create_session(&repo);
        assert!(created.update_basics(BasicsPatch::SetType(LbType::Nlb)));
        assert_eq!(created.draft().lb_type, LbType::Nlb);
    }

    #[test]
    fn failed_submit_keeps_draft_for_retry() {
        let repo = MemoryRepository::new();
        let mut s = edit_session(&repo, "alb-1", None);
        fill_basics(&mut s);
        s.save_listener(named_listener("web"));
        let before = s.draft().clone();

        s.begin_submit().unwrap();
        s.finish_submit(Err(AppError::Provision("capacity unavailable".into())));
        assert_eq!(s.draft(), &before);
        assert!(repo.contains(s.key()));
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, HostEvent::Toast(t) if t.severity == Severity::Error)));
        assert!(s.begin_submit().is_ok());
    }

    #[test]
    fn cancel_clears_storage() {
        let repo = MemoryRepository::new();
        let mut s = edit_session(&repo, "alb-1", None);
        fill_basics(&mut s);
        assert!(!repo.is_empty());
        s.cancel();
        assert!(repo.is_empty());
        assert_eq!(s.drain_events(), vec![HostEvent::Cancelled]);
    }

    #[test]
    fn rejected_editor_save_surfaces_a_toast() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        s.add_listener().unwrap();
        s.editor_apply(ListenerPatch::SetProtocol(Protocol::Https)).unwrap();
        assert!(s.editor_save().is_err());
        assert!(s.draft().listeners.is_empty());
        assert_eq!(s.editor().state(), EditorState::EditingFresh);
        assert!(matches!(s.drain_events().as_slice(), [HostEvent::Toast(_)]));
    }

    #[test]
    fn save_from_view_keeps_editor_open_with_enriched_listener() {
        let repo = MemoryRepository::new();
        let mut s = create_session(&repo);
        let saved = s.save_listener(named_listener("web"));
        s.open_listener(&saved.id, EntryMode::View).unwrap();
        s.editor_begin_edit().unwrap();
        let pool = saved.pools[0].id.clone();
        s.editor_apply(ListenerPatch::Pool(pool, PoolPatch::SetTargetGroup("api-service-targets".into())))
            .unwrap();
        let stored = s.editor_save().unwrap();

        assert_eq!(s.editor().state(), EditorState::Viewing);
        assert_eq!(s.editor().listener(), Some(&stored));
        assert_eq!(stored.pools[0].target_group_status, Some(HealthStatus::Healthy));
        assert_eq!(s.draft().listeners[0], stored);
    }
}
