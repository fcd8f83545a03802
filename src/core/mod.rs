//! Core module - workflow engine, classification and validation

pub mod amendment;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod entity;
pub mod filter;
pub mod gate;
pub mod sla;
pub mod validation;
pub mod workflow;

use miette::Diagnostic;
use thiserror::Error;

pub use amendment::{AmendmentError, AmendmentIndex};
pub use catalog::{Catalog, CatalogError};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use entity::{Archive, NamedEnum, Priority, TrackedEntity};
pub use filter::{FacetDef, FieldValue, FilterError, FilterState, Filterable};
pub use gate::{check_style_invariants, StageGate, StageGateViolation};
pub use sla::{classify, Classified, SlaPolicy, SlaStatus, SlaSummary};
pub use validation::{
    validate_composition, CompositionError, Draft, MissingField, RequiredFields, ValidationError,
};
pub use workflow::{AnyState, TransitionTable, WorkflowError, WorkflowKind, WorkflowRegistry, WorkflowState};

/// Any failure reported by the engine
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(code(tcm::workflow))]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    #[diagnostic(code(tcm::stage_gate))]
    StageGate(#[from] StageGateViolation),

    #[error(transparent)]
    #[diagnostic(code(tcm::validation))]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(code(tcm::filter))]
    Filter(#[from] FilterError),

    #[error(transparent)]
    #[diagnostic(code(tcm::amendment))]
    Amendment(#[from] AmendmentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl From<CompositionError> for EngineError {
    fn from(err: CompositionError) -> Self {
        EngineError::Validation(err.into())
    }
}

impl From<MissingField> for EngineError {
    fn from(err: MissingField) -> Self {
        EngineError::Validation(err.into())
    }
}
