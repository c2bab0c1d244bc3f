use thiserror::Error;

use crate::draft::ValidationError;
use crate::editor::EditorError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(Box<figment::Error>),
    #[error("Stored draft '{key}' is unreadable: {reason}")]
    CorruptDraft { key: String, reason: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("No load balancer found with id: {0}")]
    UnknownLoadBalancer(String),
    #[error("No target group named: {0}")]
    UnknownTargetGroup(String),
    #[error("Invalid value for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("Provisioning failed: {0}")]
    Provision(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
