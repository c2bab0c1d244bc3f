//! Simulated provisioning backend. A submission walks a fixed list of stages
//! with a delay between each, then reports the resource id.

use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, info};

use crate::draft::{FormMode, SubmitRequest};
use crate::error::{AppError, Result};
use crate::models::LbType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Behavior {
    pub stage_delay: Duration,
    pub simulate_failure: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self { stage_delay: Duration::from_millis(400), simulate_failure: false }
    }
}

#[derive(Debug)]
pub enum ProvisionMessage {
    Progress(String),
    Done(Result<String>),
}

/// Resource id for a new load balancer, e.g. `alb-3f9a0c1d`.
pub fn mint_id(lb_type: LbType) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", lb_type.key_prefix(), &raw[..8])
}

fn stages(request: &SubmitRequest) -> Vec<String> {
    let d = &request.draft;
    let verb = if request.mode.is_edit() { "Updating" } else { "Creating" };
    vec![
        "Validating configuration".to_string(),
        format!("{} {} '{}' in {}", verb, d.lb_type.label(), d.name, d.region),
        format!("Attaching to {} / {}", d.vpc, d.subnet),
        format!("Configuring {} listener(s)", d.listeners.len()),
        "Registering target groups".to_string(),
    ]
}

/// Run a submission to completion, reporting each stage through `progress`.
pub fn provision(request: &SubmitRequest, behavior: Behavior, mut progress: impl FnMut(&str)) -> Result<String> {
    let all = stages(request);
    let fail_at = all.len() - 1;
    for (i, stage) in all.iter().enumerate() {
        debug!(stage = %stage, "provisioning stage");
        progress(stage);
        std::thread::sleep(behavior.stage_delay);
        if behavior.simulate_failure && i == fail_at {
            return Err(AppError::Provision(format!(
                "{} failed: insufficient capacity in {}",
                stage, request.draft.region
            )));
        }
    }
    let id = match &request.mode {
        FormMode::Edit { resource_id } => resource_id.clone(),
        FormMode::Create => mint_id(request.draft.lb_type),
    };
    info!(id = %id, name = %request.draft.name, "provisioning finished");
    Ok(id)
}

/// Run [`provision`] on a background thread.
pub fn spawn(request: SubmitRequest, behavior: Behavior, tx: Sender<ProvisionMessage>) {
    std::thread::spawn(move || {
        let progress_tx = tx.clone();
        let result = provision(&request, behavior, |stage| {
            let _ = progress_tx.send(ProvisionMessage::Progress(stage.to_string()));
        });
        let _ = tx.send(ProvisionMessage::Done(result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoadBalancerDraft;
    use std::sync::mpsc;

    fn request(mode: FormMode, lb_type: LbType) -> SubmitRequest {
        let mut draft = LoadBalancerDraft::new(lb_type);
        draft.name = "edge".into();
        draft.region = "us-east-1".into();
        SubmitRequest { mode, draft }
    }

    fn fast() -> Behavior {
        Behavior { stage_delay: Duration::ZERO, simulate_failure: false }
    }

    #[test]
    fn create_mints_a_typed_id() {
        let mut seen = Vec::new();
        let id = provision(&request(FormMode::Create, LbType::Nlb), fast(), |s| seen.push(s.to_string())).unwrap();
        assert!(id.starts_with("nlb-"));
        assert_eq!(id.len(), "nlb-".len() + 8);
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], "Validating configuration");
    }

    #[test]
    fn edit_keeps_the_resource_id() {
        let req = request(FormMode::Edit { resource_id: "alb-7f3a9c21".into() }, LbType::Alb);
        assert_eq!(provision(&req, fast(), |_| {}).unwrap(), "alb-7f3a9c21");
    }

    #[test]
    fn simulated_failure_is_reported() {
        let behavior = Behavior { simulate_failure: true, ..fast() };
        let err = provision(&request(FormMode::Create, LbType::Alb), behavior, |_| {}).unwrap_err();
        assert!(matches!(err, AppError::Provision(_)));
    }

    #[test]
    fn spawn_reports_progress_then_done() {
        let (tx, rx) = mpsc::channel();
        spawn(request(FormMode::Create, LbType::Alb), fast(), tx);
        let messages: Vec<ProvisionMessage> = rx.iter().collect();
        assert!(matches!(messages.last(), Some(ProvisionMessage::Done(Ok(id))) if id.starts_with("alb-")));
        let progress = messages
            .iter()
            .filter(|m| matches!(m, ProvisionMessage::Progress(_)))
            .count();
        assert_eq!(progress, 5);
    }
}
