//! Inspection entity type - Factory quality inspections against an AQL plan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Archive, NamedEnum, Priority, TrackedEntity};
use crate::core::filter::{is_flag, FacetDef, FieldValue, Filterable};
use crate::core::workflow::{
    AnyState, TransitionTable, TransitionToken, WorkflowKind, WorkflowRegistry, WorkflowState,
};

named_enum! {
    /// Inspection workflow state
    #[derive(Default)]
    pub enum InspectionState {
        #[default]
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        InProgress => "in_progress",
        PendingReview => "pending_review",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl WorkflowState for InspectionState {
    const KIND: WorkflowKind = WorkflowKind::Inspection;

    fn table(registry: &WorkflowRegistry) -> &TransitionTable<Self> {
        &registry.inspection
    }

    fn into_any(self) -> AnyState {
        AnyState::Inspection(self)
    }
}

named_enum! {
    /// Inspection verdict
    #[derive(Default)]
    pub enum InspectionResult {
        Pass => "pass",
        Fail => "fail",
        Conditional => "conditional",
        #[default]
        Pending => "pending",
    }
}

named_enum! {
    /// When in the production cycle the inspection happens
    #[derive(Default)]
    pub enum InspectionType {
        PreProduction => "pre_production",
        DuringProduction => "during_production",
        #[default]
        PreShipment => "pre_shipment",
    }
}

/// Defects found, by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectCounts {
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

impl DefectCounts {
    /// Total defects across all severities
    pub fn total(&self) -> u64 {
        u64::from(self.critical) + u64::from(self.major) + u64::from(self.minor)
    }
}

/// A scheduled factory inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    /// Unique identifier
    pub id: String,

    /// Human-facing inspection number (e.g., "INS-2024-014")
    pub number: String,

    /// Purchase order under inspection
    #[serde(default)]
    pub po_number: String,

    #[serde(default)]
    pub product_name: String,

    #[serde(default)]
    pub supplier_name: String,

    #[serde(default)]
    pub inspection_type: InspectionType,

    /// Workflow state
    #[serde(default)]
    pub status: InspectionState,

    #[serde(default)]
    pub result: InspectionResult,

    #[serde(default)]
    pub defect_counts: DefectCounts,

    /// AQL sampling level (e.g., "2.5")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aql_level: Option<String>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub archive: Archive,
}

impl Inspection {
    /// Create a scheduled inspection with empty payload
    pub fn new(id: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            po_number: String::new(),
            product_name: String::new(),
            supplier_name: String::new(),
            inspection_type: InspectionType::default(),
            status: InspectionState::default(),
            result: InspectionResult::default(),
            defect_counts: DefectCounts::default(),
            aql_level: None,
            priority: Priority::default(),
            due_date: None,
            archive: Archive::default(),
        }
    }

    /// Whether any critical defect was recorded
    pub fn has_critical_defects(&self) -> bool {
        self.defect_counts.critical > 0
    }
}

impl TrackedEntity for Inspection {
    type State = InspectionState;

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> InspectionState {
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

    fn write_state(&mut self, state: InspectionState, _: TransitionToken) {
        self.status = state;
    }
}

impl Filterable for Inspection {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["number", "po_number", "product_name", "supplier_name"];

    const FACETS: &'static [FacetDef] = &[
        FacetDef::choice("status", InspectionState::is_canonical),
        FacetDef::choice("result", InspectionResult::is_canonical),
        FacetDef::choice("inspection_type", InspectionType::is_canonical),
        FacetDef::choice("priority", Priority::is_canonical),
        FacetDef::text("supplier_name"),
        FacetDef::text("aql_level"),
        FacetDef::choice("archived", is_flag),
        FacetDef::range("total_defects"),
        FacetDef::range("critical_defects"),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "id" => FieldValue::Text(&self.id),
            "number" => FieldValue::Text(&self.number),
            "po_number" => FieldValue::Text(&self.po_number),
            "product_name" => FieldValue::Text(&self.product_name),
            "supplier_name" => FieldValue::Text(&self.supplier_name),
            "status" => FieldValue::Text(self.status.as_str()),
            "result" => FieldValue::Text(self.result.as_str()),
            "inspection_type" => FieldValue::Text(self.inspection_type.as_str()),
            "priority" => FieldValue::Text(self.priority.as_str()),
            "aql_level" => FieldValue::Text(self.aql_level.as_deref()?),
            "archived" => FieldValue::Text(self.archive.facet_value()),
            "total_defects" => {
                FieldValue::Number(i64::try_from(self.defect_counts.total()).unwrap_or(i64::MAX))
            }
            "critical_defects" => FieldValue::Number(i64::from(self.defect_counts.critical)),
            _ => return None,
        };
        Some(value)
    }
}
