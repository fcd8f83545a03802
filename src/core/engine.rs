//! Engine facade: configuration bound to the operations that use it

use chrono::{DateTime, Utc};

use crate::core::config::EngineConfig;
use crate::core::entity::TrackedEntity;
use crate::core::gate::StageGate;
use crate::core::sla::{classify_all, Classified, SlaStatus, SlaSummary};
use crate::core::validation::{validate_component, validate_style, ValidationError};
use crate::core::workflow::{WorkflowError, WorkflowRegistry, WorkflowState};
use crate::entities::{Component, Style};

/// Compliance engine built from an [`EngineConfig`]
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.config.workflows
    }

    pub fn stage_gate(&self) -> StageGate<'_> {
        StageGate::new(&self.config.workflows)
    }

    /// States reachable from `current` in one step
    pub fn legal_transitions<S: WorkflowState>(&self, current: S) -> Vec<S> {
        self.registry().legal_transitions(current)
    }

    /// Move an entity to `target`, returning the previous state
    pub fn apply_transition<E: TrackedEntity>(
        &self,
        entity: &mut E,
        target: E::State,
    ) -> Result<E::State, WorkflowError> {
        self.registry().apply_transition(entity, target)
    }

    /// Live SLA badge of one entity
    pub fn classify<E: TrackedEntity>(&self, entity: &E, now: DateTime<Utc>) -> Option<SlaStatus> {
        self.config
            .sla
            .classify_entity(self.registry(), entity, now)
    }

    /// Every entity paired with its live badge
    pub fn classify_all<'a, E: TrackedEntity>(
        &self,
        items: &'a [E],
        now: DateTime<Utc>,
    ) -> Vec<Classified<'a, E>> {
        classify_all(items, self.registry(), &self.config.sla, now)
    }

    /// Badge counts over a slice
    pub fn summarize<E: TrackedEntity>(&self, items: &[E], now: DateTime<Utc>) -> SlaSummary {
        SlaSummary::from_statuses(items.iter().map(|e| self.classify(e, now)))
    }

    pub fn validate_component(&self, component: &Component) -> Result<(), ValidationError> {
        validate_component(component, &self.config.required_fields)
    }

    pub fn validate_style(&self, style: &Style) -> Result<(), ValidationError> {
        validate_style(style, &self.config.required_fields)
    }
}
