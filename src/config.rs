//! Runtime configuration: built-in defaults, then `config.toml`, then
//! `LBDRAFT_*` environment variables. Command-line flags are applied last by
//! the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provision::Behavior;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one JSON file per stored draft.
    pub storage_dir: PathBuf,
    /// Optional JSON file replacing the built-in target group table.
    pub registry_file: Option<PathBuf>,
    /// Log file used while the TUI owns the terminal.
    pub log_file: PathBuf,
    pub log_level: String,
    pub submit_stage_delay_ms: u64,
    pub simulate_failure: bool,
    pub default_region: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: crate::storage::default_storage_dir(),
            registry_file: None,
            log_file: base_dir(dirs::state_dir()).join("lbdraft.log"),
            log_level: "info".into(),
            submit_stage_delay_ms: 400,
            simulate_failure: false,
            default_region: "us-east-1".into(),
        }
    }
}

impl Config {
    pub fn behavior(&self) -> Behavior {
        Behavior {
            stage_delay: Duration::from_millis(self.submit_stage_delay_ms),
            simulate_failure: self.simulate_failure,
        }
    }
}

fn base_dir(preferred: Option<PathBuf>) -> PathBuf {
    preferred
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into())))
        .join("lbdraft")
}

pub fn default_config_path() -> PathBuf {
    base_dir(dirs::config_dir()).join("config.toml")
}

/// Layer defaults, the TOML file at `path` (if present) and the environment.
pub fn load(path: &Path) -> Result<Config> {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LBDRAFT_"))
        .extract()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        figment::Jail::expect_with(|jail| {
            let config = load(&jail.directory().join("absent.toml")).expect("load");
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn file_then_environment_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    storage_dir = "/tmp/lbdraft-drafts"
                    submit_stage_delay_ms = 10
                    default_region = "eu-west-1"
                "#,
            )?;
            jail.set_env("LBDRAFT_SIMULATE_FAILURE", "true");
            jail.set_env("LBDRAFT_DEFAULT_REGION", "ap-south-1");

            let config = load(&jail.directory().join("config.toml")).expect("load");
            assert_eq!(config.storage_dir, PathBuf::from("/tmp/lbdraft-drafts"));
            assert_eq!(config.submit_stage_delay_ms, 10);
            assert_eq!(config.default_region, "ap-south-1");
            assert!(config.simulate_failure);
            assert_eq!(config.behavior().stage_delay, Duration::from_millis(10));
            Ok(())
        });
    }
}
