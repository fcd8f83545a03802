//! Style entity type - A product style moving through staged approvals
//!
//! A style tracks two coupled dimensions: the approval `status` of the current
//! round and the manufacturing `stage` the round applies to. The same status
//! values recur at every stage, so the two are kept as separate fields and
//! their cross-field rules live in [`crate::core::gate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::entity::{Archive, NamedEnum, Priority, TrackedEntity};
use crate::core::filter::{is_flag, FacetDef, FieldValue, Filterable};
use crate::core::gate::StageGateViolation;
use crate::core::validation::Draft;
use crate::core::workflow::{
    AnyState, TransitionTable, TransitionToken, WorkflowKind, WorkflowRegistry, WorkflowState,
};

named_enum! {
    /// Approval status of the current stage's round
    #[derive(Default)]
    pub enum StyleStatus {
        #[default]
        Pending => "pending",
        Submitted => "submitted",
        Approved => "approved",
        Rejected => "rejected",
        OnHold => "on_hold",
    }
}

impl WorkflowState for StyleStatus {
    const KIND: WorkflowKind = WorkflowKind::StyleStatus;

    fn table(registry: &WorkflowRegistry) -> &TransitionTable<Self> {
        &registry.style_status
    }

    fn into_any(self) -> AnyState {
        AnyState::StyleStatus(self)
    }
}

named_enum! {
    /// Manufacturing stage, strictly ordered
    #[derive(Default)]
    pub enum StyleStage {
        #[default]
        Base => "base",
        BaseApproved => "base_approved",
        Bulk => "bulk",
        BulkApproved => "bulk_approved",
        Product => "product",
        ProductApproved => "product_approved",
    }
}

impl WorkflowState for StyleStage {
    const KIND: WorkflowKind = WorkflowKind::StyleStage;

    fn table(registry: &WorkflowRegistry) -> &TransitionTable<Self> {
        &registry.style_stage
    }

    fn into_any(self) -> AnyState {
        AnyState::StyleStage(self)
    }
}

named_enum! {
    /// Gold Seal Workbook status
    #[derive(Default)]
    pub enum GswStatus {
        #[default]
        None => "none",
        Submitted => "submitted",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// A product style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Unique identifier
    pub id: String,

    /// Buyer style number (e.g., "ST-88120")
    pub style_number: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub supplier_name: String,

    /// Season code (e.g., "SS25")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,

    /// Approval status of the current stage
    #[serde(default)]
    pub status: StyleStatus,

    #[serde(default)]
    pub stage: StyleStage,

    #[serde(default)]
    pub gsw_status: GswStatus,

    /// Linked components (many-to-many, by ID)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub component_ids: BTreeSet<String>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub archive: Archive,
}

impl Style {
    /// Create a pending style at the base stage
    pub fn new(id: impl Into<String>, style_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            style_number: style_number.into(),
            name: String::new(),
            supplier_name: String::new(),
            season: None,
            status: StyleStatus::default(),
            stage: StyleStage::default(),
            gsw_status: GswStatus::default(),
            component_ids: BTreeSet::new(),
            priority: Priority::default(),
            due_date: None,
            archive: Archive::default(),
        }
    }

    /// Link a component; returns false if it was already linked
    pub fn link_component(&mut self, component_id: impl Into<String>) -> bool {
        self.component_ids.insert(component_id.into())
    }

    /// Unlink a component; returns false if it was not linked
    pub fn unlink_component(&mut self, component_id: &str) -> bool {
        self.component_ids.remove(component_id)
    }
}

impl TrackedEntity for Style {
    type State = StyleStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> StyleStatus {
        self.status
    }

    fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn archive(&self) -> &Archive {
        &self.archive
    }

    fn archive_mut(&mut self) -> &mut Archive {
        &mut self.archive
    }

    /// A style carrying a workbook keeps its approval
    fn guard_transition(&self, target: StyleStatus) -> Result<(), StageGateViolation> {
        if self.gsw_status != GswStatus::None && target != StyleStatus::Approved {
            return Err(StageGateViolation::GswLocked {
                gsw: self.gsw_status,
            });
        }
        Ok(())
    }

    fn write_state(&mut self, state: StyleStatus, _: TransitionToken) {
        self.status = state;
    }
}

impl Draft for Style {
    fn has_field(&self, name: &str) -> bool {
        match name {
            "id" => !self.id.trim().is_empty(),
            "style_number" => !self.style_number.trim().is_empty(),
            "name" => !self.name.trim().is_empty(),
            "supplier_name" => !self.supplier_name.trim().is_empty(),
            "season" => self.season.as_deref().is_some_and(|s| !s.trim().is_empty()),
            "components" => !self.component_ids.is_empty(),
            "due_date" => self.due_date.is_some(),
            _ => false,
        }
    }
}

impl Filterable for Style {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["style_number", "name", "supplier_name", "season"];

    const FACETS: &'static [FacetDef] = &[
        FacetDef::choice("status", StyleStatus::is_canonical),
        FacetDef::choice("stage", StyleStage::is_canonical),
        FacetDef::choice("gsw_status", GswStatus::is_canonical),
        FacetDef::choice("priority", Priority::is_canonical),
        FacetDef::text("supplier_name"),
        FacetDef::text("season"),
        FacetDef::choice("archived", is_flag),
        FacetDef::range("components"),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "id" => FieldValue::Text(&self.id),
            "style_number" => FieldValue::Text(&self.style_number),
            "name" => FieldValue::Text(&self.name),
            "supplier_name" => FieldValue::Text(&self.supplier_name),
            "season" => FieldValue::Text(self.season.as_deref()?),
            "status" => FieldValue::Text(self.status.as_str()),
            "stage" => FieldValue::Text(self.stage.as_str()),
            "gsw_status" => FieldValue::Text(self.gsw_status.as_str()),
            "priority" => FieldValue::Text(self.priority.as_str()),
            "archived" => FieldValue::Text(self.archive.facet_value()),
            "components" => {
                FieldValue::Number(i64::try_from(self.component_ids.len()).unwrap_or(i64::MAX))
            }
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let stages = StyleStage::ALL;
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stages.first(), Some(&StyleStage::Base));
        assert_eq!(stages.last(), Some(&StyleStage::ProductApproved));
    }

    #[test]
    fn test_component_links() {
        let mut style = Style::new("STY-1", "ST-88120");
        assert!(style.link_component("CMP-1"));
        assert!(!style.link_component("CMP-1"));
        assert!(style.link_component("CMP-2"));
        assert_eq!(style.component_ids.len(), 2);

        assert!(style.unlink_component("CMP-1"));
        assert!(!style.unlink_component("CMP-1"));
        assert_eq!(style.component_ids.len(), 1);
    }

    #[test]
    fn test_guard_locks_status_while_workbook_present() {
        let mut style = Style::new("STY-1", "ST-88120");
        assert!(style.guard_transition(StyleStatus::Pending).is_ok());

        style.gsw_status = GswStatus::Submitted;
        assert_eq!(
            style.guard_transition(StyleStatus::Pending),
            Err(StageGateViolation::GswLocked {
                gsw: GswStatus::Submitted
            })
        );
    }

    #[test]
    fn test_gsw_none_serializes_as_none_string() {
        let style = Style::new("STY-1", "ST-88120");
        let yaml = serde_yml::to_string(&style).unwrap();
        assert!(yaml.contains("gsw_status: none"));
    }
}
