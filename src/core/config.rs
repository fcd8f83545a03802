//! Engine configuration
//!
//! Configuration hierarchy (highest priority first):
//! 1. Explicit path (`--config` / `TCM_CONFIG`)
//! 2. `.tcm/config.yaml` in the working directory or any ancestor
//! 3. User config directory (e.g. `~/.config/tcm/config.yaml`)
//! 4. Built-in defaults

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::entity::NamedEnum;
use crate::core::sla::SlaPolicy;
use crate::core::validation::RequiredFields;
use crate::core::workflow::{TransitionTable, WorkflowKind, WorkflowRegistry, WorkflowState};
use crate::entities::ComponentType;
use crate::yaml::{parse_yaml, YamlError};

/// Directory holding project-level configuration
pub const CONFIG_DIR: &str = ".tcm";

/// Configuration file name
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TCM_CONFIG";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("Config file not found: {}", path.display())]
    #[diagnostic(code(tcm::config::not_found))]
    NotFound { path: PathBuf },

    #[error("Invalid risk window {days} days for {scope}, must be zero or more")]
    #[diagnostic(code(tcm::config::risk_window))]
    InvalidRiskWindow { scope: String, days: i64 },

    #[error("Workflow {kind} declares transitions out of terminal state '{state}'")]
    #[diagnostic(
        code(tcm::config::terminal_reopened),
        help("terminal states must keep an empty transition list")
    )]
    TerminalReopened {
        kind: WorkflowKind,
        state: &'static str,
    },

    #[error("Workflow {kind} leaves state '{state}' without any transition")]
    #[diagnostic(
        code(tcm::config::dead_end),
        help("only declared terminal states may have no outgoing transitions")
    )]
    DeadEnd {
        kind: WorkflowKind,
        state: &'static str,
    },

    #[error("Required fields declared for unknown record type '{record_type}'")]
    #[diagnostic(
        code(tcm::config::unknown_record_type),
        help("known record types: fabric, trim, style")
    )]
    UnknownRecordType { record_type: String },
}

/// Everything supplied to the engine at construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SLA risk windows
    pub sla: SlaPolicy,

    /// Required fields per record type
    pub required_fields: RequiredFields,

    /// Transition tables; kinds left out keep the built-in table
    pub workflows: WorkflowRegistry,
}

impl EngineConfig {
    /// Parse and check a configuration document
    pub fn parse(content: &str, filename: &str) -> Result<Self, ConfigError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            parse_yaml(content, filename)?
        };
        config.check()?;
        Ok(config)
    }

    /// Load from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(YamlError::from)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Find and load configuration, falling back to defaults
    ///
    /// An explicit path must exist; discovered locations are optional.
    pub fn discover(explicit: Option<&Path>, start: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "using explicit config");
            return Self::from_file(path);
        }

        if let Some(path) = find_project_config(start) {
            tracing::info!(path = %path.display(), "using project config");
            return Self::from_file(&path);
        }

        if let Some(path) = user_config_path().filter(|p| p.is_file()) {
            tracing::info!(path = %path.display(), "using user config");
            return Self::from_file(&path);
        }

        tracing::info!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.sla.risk_window_days < 0 {
            return Err(ConfigError::InvalidRiskWindow {
                scope: "all kinds".to_string(),
                days: self.sla.risk_window_days,
            });
        }
        if let Some((kind, days)) = self.sla.overrides.iter().find(|(_, d)| **d < 0) {
            return Err(ConfigError::InvalidRiskWindow {
                scope: kind.to_string(),
                days: *days,
            });
        }

        if let Some(unknown) = self
            .required_fields
            .record_types()
            .find(|t| !is_record_type(t))
        {
            return Err(ConfigError::UnknownRecordType {
                record_type: unknown.to_string(),
            });
        }

        let builtin = WorkflowRegistry::builtin();
        check_table(&self.workflows.test_request, &builtin.test_request)?;
        check_table(&self.workflows.inspection, &builtin.inspection)?;
        check_table(&self.workflows.style_status, &builtin.style_status)?;
        check_table(&self.workflows.style_stage, &builtin.style_stage)?;
        Ok(())
    }
}

/// Record types that can carry required-field declarations
fn is_record_type(name: &str) -> bool {
    name == "style" || ComponentType::is_canonical(name)
}

/// A configured table must keep the built-in terminal states terminal and
/// give every other state at least one way out
fn check_table<S: WorkflowState>(
    table: &TransitionTable<S>,
    builtin: &TransitionTable<S>,
) -> Result<(), ConfigError> {
    let states = || S::ALL.iter().copied();
    if let Some(state) = states().find(|s| builtin.is_terminal(*s) && !table.is_terminal(*s)) {
        return Err(ConfigError::TerminalReopened {
            kind: S::KIND,
            state: state.as_str(),
        });
    }
    if let Some(state) = states().find(|s| !builtin.is_terminal(*s) && table.is_terminal(*s)) {
        return Err(ConfigError::DeadEnd {
            kind: S::KIND,
            state: state.as_str(),
        });
    }
    Ok(())
}

/// Search `start` and its ancestors for `.tcm/config.yaml`
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .find(|path| path.is_file())
}

/// Per-user config file location, if the platform has one
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tcm").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
