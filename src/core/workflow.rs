//! Workflow registry for state transitions
//!
//! Every tracked entity kind declares its legal states as an enum and its
//! legal moves as an explicit edge table. Nothing is implied: a state with no
//! outgoing edge is terminal, and a move that is not listed is rejected.
//! The same representation serves all kinds, so a single step indicator can
//! render any of them.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

use crate::core::entity::{NamedEnum, TrackedEntity};
use crate::core::gate::StageGateViolation;
use crate::entities::inspection::InspectionState;
use crate::entities::style::{StyleStage, StyleStatus};
use crate::entities::test_request::TestRequestState;

named_enum! {
    /// The workflow-governed dimensions known to the registry
    pub enum WorkflowKind {
        TestRequest => "test_request",
        Inspection => "inspection",
        StyleStatus => "style_status",
        StyleStage => "style_stage",
    }
}

/// Errors that can occur during workflow operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Invalid {kind} transition: {from} → {to}")]
    InvalidTransition {
        kind: WorkflowKind,
        from: &'static str,
        to: &'static str,
    },

    #[error("Unknown {kind} state '{value}'")]
    UnknownState { kind: WorkflowKind, value: String },

    #[error(transparent)]
    Guarded(#[from] StageGateViolation),
}

/// A state enumeration governed by the registry
pub trait WorkflowState:
    NamedEnum + Ord + Hash + Debug + std::fmt::Display + Serialize + DeserializeOwned
{
    /// Which workflow this state belongs to
    const KIND: WorkflowKind;

    /// The edge table for this kind inside a registry
    fn table(registry: &WorkflowRegistry) -> &TransitionTable<Self>;

    /// Wrap into the kind-tagged state
    fn into_any(self) -> AnyState;
}

/// A state tagged with its workflow kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum AnyState {
    TestRequest(TestRequestState),
    Inspection(InspectionState),
    StyleStatus(StyleStatus),
    StyleStage(StyleStage),
}

impl AnyState {
    /// The workflow this state belongs to
    pub fn kind(&self) -> WorkflowKind {
        match self {
            AnyState::TestRequest(_) => WorkflowKind::TestRequest,
            AnyState::Inspection(_) => WorkflowKind::Inspection,
            AnyState::StyleStatus(_) => WorkflowKind::StyleStatus,
            AnyState::StyleStage(_) => WorkflowKind::StyleStage,
        }
    }

    /// Canonical state name (without the kind)
    pub fn as_str(&self) -> &'static str {
        match self {
            AnyState::TestRequest(s) => s.as_str(),
            AnyState::Inspection(s) => s.as_str(),
            AnyState::StyleStatus(s) => s.as_str(),
            AnyState::StyleStage(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for AnyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission to write a tracked state, issued only by
/// [`WorkflowRegistry::apply_transition`]
#[derive(Debug)]
pub struct TransitionToken {
    _private: (),
}

/// One declared move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge<S> {
    pub from: S,
    pub to: S,
}

/// The declared edge list of one workflow kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionTable<S> {
    edges: Vec<Edge<S>>,
}

impl<S: WorkflowState> TransitionTable<S> {
    /// Build a table from `(from, to)` pairs, dropping duplicates
    pub fn new(edges: impl IntoIterator<Item = (S, S)>) -> Self {
        let mut table = Self { edges: Vec::new() };
        for (from, to) in edges {
            let edge = Edge { from, to };
            if !table.edges.contains(&edge) {
                table.edges.push(edge);
            }
        }
        table
    }

    /// Build a table where each `(from, [to...])` row lists a state's successors
    pub fn from_rows(rows: &[(S, &[S])]) -> Self {
        Self::new(
            rows.iter()
                .flat_map(|(from, tos)| tos.iter().map(move |to| (*from, *to))),
        )
    }

    /// All declared edges
    pub fn edges(&self) -> &[Edge<S>] {
        &self.edges
    }

    /// States reachable from `from` in exactly one step, in declaration order
    pub fn successors(&self, from: S) -> Vec<S> {
        self.edges
            .iter()
            .filter(|e| e.from == from)
            .map(|e| e.to)
            .collect()
    }

    /// Whether `from → to` is declared
    pub fn allows(&self, from: S, to: S) -> bool {
        self.edges.iter().any(|e| e.from == from && e.to == to)
    }

    /// Whether `state` has no outgoing edges
    pub fn is_terminal(&self, state: S) -> bool {
        !self.edges.iter().any(|e| e.from == state)
    }

    /// All terminal states, in declaration order of the enum
    pub fn terminal_states(&self) -> Vec<S> {
        S::ALL
            .iter()
            .copied()
            .filter(|s| self.is_terminal(*s))
            .collect()
    }

    /// The forward path a step indicator renders
    ///
    /// Starts at the initial (first declared) state and follows the first
    /// declared successor until a terminal or already visited state.
    pub fn primary_path(&self) -> Vec<S> {
        let Some(&initial) = S::ALL.first() else {
            return Vec::new();
        };
        let mut path = vec![initial];
        let mut current = initial;
        while let Some(next) = self.successors(current).first().copied() {
            if path.contains(&next) {
                break;
            }
            path.push(next);
            current = next;
        }
        path
    }
}

/// Registry of edge tables for every workflow kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowRegistry {
    pub test_request: TransitionTable<TestRequestState>,
    pub inspection: TransitionTable<InspectionState>,
    pub style_status: TransitionTable<StyleStatus>,
    pub style_stage: TransitionTable<StyleStage>,
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WorkflowRegistry {
    /// The standard compliance workflows
    pub fn builtin() -> Self {
        use InspectionState as I;
        use StyleStage as G;
        use StyleStatus as Y;
        use TestRequestState as T;

        Self {
            // Linear chain with two side exits (on hold, rejected)
            test_request: TransitionTable::<T>::from_rows(&[
                (T::Draft, &[T::Submitted]),
                (T::Submitted, &[T::InReview, T::OnHold, T::Rejected]),
                (T::InReview, &[T::Approved, T::OnHold, T::Rejected]),
                (T::Approved, &[T::Testing, T::OnHold]),
                (T::Testing, &[T::Completed, T::OnHold]),
                (T::OnHold, &[T::Submitted, T::Rejected]),
            ]),
            // Short chain with one side exit (cancelled)
            inspection: TransitionTable::<I>::from_rows(&[
                (I::Scheduled, &[I::Confirmed, I::Cancelled]),
                (I::Confirmed, &[I::InProgress, I::Cancelled]),
                (I::InProgress, &[I::PendingReview, I::Cancelled]),
                (I::PendingReview, &[I::Completed, I::Cancelled]),
            ]),
            // Approval round, repeated at every stage
            style_status: TransitionTable::<Y>::from_rows(&[
                (Y::Pending, &[Y::Submitted, Y::OnHold]),
                (Y::Submitted, &[Y::Approved, Y::Rejected, Y::OnHold]),
                (Y::Approved, &[Y::Pending]),
                (Y::Rejected, &[Y::Pending]),
                (Y::OnHold, &[Y::Pending, Y::Submitted]),
            ]),
            style_stage: TransitionTable::<G>::from_rows(&[
                (G::Base, &[G::BaseApproved]),
                (G::BaseApproved, &[G::Bulk]),
                (G::Bulk, &[G::BulkApproved]),
                (G::BulkApproved, &[G::Product]),
                (G::Product, &[G::ProductApproved]),
            ]),
        }
    }

    /// The edge table for a state type
    pub fn table<S: WorkflowState>(&self) -> &TransitionTable<S> {
        S::table(self)
    }

    /// States reachable from `current` in exactly one step
    pub fn legal_transitions<S: WorkflowState>(&self, current: S) -> Vec<S> {
        self.table::<S>().successors(current)
    }

    /// Whether `state` has no outgoing transitions
    pub fn is_terminal<S: WorkflowState>(&self, state: S) -> bool {
        self.table::<S>().is_terminal(state)
    }

    /// Check if a transition is declared
    pub fn is_legal<S: WorkflowState>(&self, from: S, to: S) -> bool {
        self.table::<S>().allows(from, to)
    }

    /// Verify a transition is declared
    pub fn check_transition<S: WorkflowState>(&self, from: S, to: S) -> Result<(), WorkflowError> {
        if self.is_legal(from, to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                kind: S::KIND,
                from: from.as_str(),
                to: to.as_str(),
            })
        }
    }

    /// Kind-tagged form of [`legal_transitions`](Self::legal_transitions)
    pub fn legal_transitions_of(&self, state: AnyState) -> Vec<AnyState> {
        match state {
            AnyState::TestRequest(s) => wrap(self.legal_transitions(s)),
            AnyState::Inspection(s) => wrap(self.legal_transitions(s)),
            AnyState::StyleStatus(s) => wrap(self.legal_transitions(s)),
            AnyState::StyleStage(s) => wrap(self.legal_transitions(s)),
        }
    }

    /// Kind-tagged form of [`is_terminal`](Self::is_terminal)
    pub fn is_terminal_of(&self, state: AnyState) -> bool {
        match state {
            AnyState::TestRequest(s) => self.is_terminal(s),
            AnyState::Inspection(s) => self.is_terminal(s),
            AnyState::StyleStatus(s) => self.is_terminal(s),
            AnyState::StyleStage(s) => self.is_terminal(s),
        }
    }

    /// Step-indicator path for a kind
    pub fn steps(&self, kind: WorkflowKind) -> Vec<AnyState> {
        match kind {
            WorkflowKind::TestRequest => wrap(self.test_request.primary_path()),
            WorkflowKind::Inspection => wrap(self.inspection.primary_path()),
            WorkflowKind::StyleStatus => wrap(self.style_status.primary_path()),
            WorkflowKind::StyleStage => wrap(self.style_stage.primary_path()),
        }
    }

    /// Every declared state of a kind, in declaration order
    pub fn states_of(kind: WorkflowKind) -> Vec<AnyState> {
        match kind {
            WorkflowKind::TestRequest => wrap(TestRequestState::ALL.to_vec()),
            WorkflowKind::Inspection => wrap(InspectionState::ALL.to_vec()),
            WorkflowKind::StyleStatus => wrap(StyleStatus::ALL.to_vec()),
            WorkflowKind::StyleStage => wrap(StyleStage::ALL.to_vec()),
        }
    }

    /// Parse a state name for the given kind
    pub fn parse_state(kind: WorkflowKind, value: &str) -> Result<AnyState, WorkflowError> {
        let unknown = || WorkflowError::UnknownState {
            kind,
            value: value.to_string(),
        };
        match kind {
            WorkflowKind::TestRequest => value
                .parse::<TestRequestState>()
                .map(AnyState::TestRequest)
                .map_err(|_| unknown()),
            WorkflowKind::Inspection => value
                .parse::<InspectionState>()
                .map(AnyState::Inspection)
                .map_err(|_| unknown()),
            WorkflowKind::StyleStatus => value
                .parse::<StyleStatus>()
                .map(AnyState::StyleStatus)
                .map_err(|_| unknown()),
            WorkflowKind::StyleStage => value
                .parse::<StyleStage>()
                .map(AnyState::StyleStage)
                .map_err(|_| unknown()),
        }
    }

    /// Move an entity to `target`
    ///
    /// Fails with [`WorkflowError::InvalidTransition`] if the move is not
    /// declared (including any move out of a terminal state), or with
    /// [`WorkflowError::Guarded`] if the entity's own precondition refuses it.
    /// Returns the previous state. Derived values (SLA badges) are not touched.
    pub fn apply_transition<E: TrackedEntity>(
        &self,
        entity: &mut E,
        target: E::State,
    ) -> Result<E::State, WorkflowError> {
        let from = entity.state();
        self.check_transition(from, target)?;
        entity.guard_transition(target)?;
        entity.write_state(target, TransitionToken { _private: () });
        let kind = <E::State as WorkflowState>::KIND;
        tracing::debug!(
            kind = %kind,
            id = entity.id(),
            from = %from,
            to = %target,
            "applied transition"
        );
        Ok(from)
    }
}

fn wrap<S: WorkflowState>(states: Vec<S>) -> Vec<AnyState> {
    states.into_iter().map(WorkflowState::into_any).collect()
}
