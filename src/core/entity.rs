//! Entity traits - common interface for all tracked entity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::gate::StageGateViolation;
use crate::core::workflow::{TransitionToken, WorkflowState};

/// A closed enumeration with a canonical lowercase name per value
pub trait NamedEnum: Copy + Eq + 'static {
    /// Every value, in declaration order
    const ALL: &'static [Self];

    /// Canonical lowercase name
    fn as_str(&self) -> &'static str;

    /// Whether `value` is the canonical name of one of the values
    fn is_canonical(value: &str) -> bool {
        Self::ALL.iter().any(|v| v.as_str() == value)
    }
}

named_enum! {
    /// Priority values common across entity types
    ///
    /// Ordered most urgent first, so an ascending sort puts urgent work on top.
    #[derive(Default)]
    pub enum Priority {
        Urgent => "urgent",
        High => "high",
        #[default]
        Normal => "normal",
        Low => "low",
    }
}

/// Soft-delete marker
///
/// Entities are never removed, only archived. Archiving is orthogonal to the
/// workflow state and never changes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    /// Whether the entity is archived
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub archived: bool,

    /// Why it was archived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_reason: Option<String>,
}

impl Archive {
    /// Mark as archived, replacing any previous reason
    pub fn archive(&mut self, reason: Option<String>) {
        self.archived = true;
        self.archive_reason = reason.filter(|r| !r.trim().is_empty());
    }

    /// Clear the archived flag and its reason
    pub fn restore(&mut self) {
        self.archived = false;
        self.archive_reason = None;
    }

    /// Facet value for the `archived` filter dimension
    pub fn facet_value(&self) -> &'static str {
        if self.archived {
            "true"
        } else {
            "false"
        }
    }
}

/// Common trait for entities whose lifecycle is governed by a workflow
///
/// State is only written through
/// [`WorkflowRegistry::apply_transition`](crate::core::workflow::WorkflowRegistry::apply_transition).
pub trait TrackedEntity {
    /// The state enumeration of this entity kind
    type State: WorkflowState;

    /// Get the entity's unique ID
    fn id(&self) -> &str;

    /// Get the current workflow state
    fn state(&self) -> Self::State;

    /// Get the due date, if one is set
    fn due_date(&self) -> Option<DateTime<Utc>>;

    /// Get the priority
    fn priority(&self) -> Priority;

    /// Get the archive marker
    fn archive(&self) -> &Archive;

    /// Get the archive marker for modification
    fn archive_mut(&mut self) -> &mut Archive;

    /// Entity-specific precondition checked before a legal transition is applied
    fn guard_transition(&self, _target: Self::State) -> Result<(), StageGateViolation> {
        Ok(())
    }

    /// Overwrite the stored state
    ///
    /// Only the registry can produce a [`TransitionToken`], so code outside it
    /// cannot set a state directly:
    ///
    /// ```compile_fail
    /// use tcm::core::workflow::TransitionToken;
    /// use tcm::core::TrackedEntity;
    /// use tcm::entities::{TestRequest, TestRequestState};
    ///
    /// let mut request = TestRequest::new("TR-1", "TR-2024-001");
    /// request.write_state(TestRequestState::Completed, TransitionToken { _private: () });
    /// ```
    fn write_state(&mut self, state: Self::State, token: TransitionToken);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_is_most_urgent_first() {
        let mut priorities = vec![Priority::Low, Priority::Urgent, Priority::Normal, Priority::High];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![Priority::Urgent, Priority::High, Priority::Normal, Priority::Low]
        );
    }

    #[test]
    fn test_priority_parse_and_display() {
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!(Priority::Normal.to_string(), "normal");
        assert!("critical".parse::<Priority>().is_err());
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_archive_restore() {
        let mut archive = Archive::default();
        assert_eq!(archive.facet_value(), "false");

        archive.archive(Some("Supplier exited programme".to_string()));
        assert!(archive.archived);
        assert_eq!(archive.facet_value(), "true");
        assert_eq!(
            archive.archive_reason.as_deref(),
            Some("Supplier exited programme")
        );

        archive.restore();
        assert_eq!(archive, Archive::default());
    }

    #[test]
    fn test_blank_archive_reason_dropped() {
        let mut archive = Archive::default();
        archive.archive(Some("   ".to_string()));
        assert!(archive.archived);
        assert!(archive.archive_reason.is_none());
    }
}
