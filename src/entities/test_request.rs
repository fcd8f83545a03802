//! Test request entity type - Laboratory testing of a product at a given level

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Archive, NamedEnum, Priority, TrackedEntity};
use crate::core::filter::{FacetDef, FieldValue, Filterable};
use crate::core::validation::ValidationError;
use crate::core::workflow::{
    AnyState, TransitionTable, TransitionToken, WorkflowKind, WorkflowRegistry, WorkflowState,
};

named_enum! {
    /// Test request workflow state
    #[derive(Default)]
    pub enum TestRequestState {
        #[default]
        Draft => "draft",
        Submitted => "submitted",
        InReview => "in_review",
        Approved => "approved",
        Testing => "testing",
        Completed => "completed",
        Rejected => "rejected",
        OnHold => "on_hold",
    }
}

impl WorkflowState for TestRequestState {
    const KIND: WorkflowKind = WorkflowKind::TestRequest;

    fn table(registry: &WorkflowRegistry) -> &TransitionTable<Self> {
        &registry.test_request
    }

    fn into_any(self) -> AnyState {
        AnyState::TestRequest(self)
    }
}

named_enum! {
    /// Testing level, strictly ordered base < bulk < garment
    #[derive(Default)]
    pub enum TestingLevel {
        #[default]
        Base => "base",
        Bulk => "bulk",
        Garment => "garment",
    }
}

/// Upper bound of [`TestRequest::progress`]
pub const MAX_PROGRESS: u8 = 100;

/// A request for laboratory testing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    /// Unique identifier
    pub id: String,

    /// Human-facing request number (e.g., "TR-2024-001")
    pub number: String,

    #[serde(default)]
    pub product_name: String,

    #[serde(default)]
    pub product_code: String,

    #[serde(default)]
    pub supplier_name: String,

    /// Workflow state
    #[serde(default)]
    pub status: TestRequestState,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub testing_level: TestingLevel,

    /// Completion percentage, 0-100
    #[serde(default)]
    pub progress: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Whether this request amends an earlier one
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_amendment: bool,

    /// The amended request (lookup by ID, not ownership)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Requested test methods (e.g., "colour fastness to washing")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<String>,

    #[serde(flatten)]
    pub archive: Archive,
}

impl TestRequest {
    /// Create a draft request with empty payload
    pub fn new(id: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            product_name: String::new(),
            product_code: String::new(),
            supplier_name: String::new(),
            status: TestRequestState::default(),
            priority: Priority::default(),
            testing_level: TestingLevel::default(),
            progress: 0,
            due_date: None,
            is_amendment: false,
            parent_id: None,
            tests: Vec::new(),
            archive: Archive::default(),
        }
    }

    /// Set completion percentage
    pub fn set_progress(&mut self, progress: u8) -> Result<(), ValidationError> {
        check_progress(progress)?;
        self.progress = progress;
        Ok(())
    }

    /// Start an amendment of this request
    ///
    /// The amendment is a fresh draft that carries over the product, supplier,
    /// testing level and requested tests, and points back at this request.
    pub fn amend(&self, id: impl Into<String>, number: impl Into<String>) -> TestRequest {
        TestRequest {
            product_name: self.product_name.clone(),
            product_code: self.product_code.clone(),
            supplier_name: self.supplier_name.clone(),
            priority: self.priority,
            testing_level: self.testing_level,
            due_date: self.due_date,
            is_amendment: true,
            parent_id: Some(self.id.clone()),
            tests: self.tests.clone(),
            ..TestRequest::new(id, number)
        }
    }
}

/// Check a progress value is within 0-100
pub fn check_progress(progress: u8) -> Result<(), ValidationError> {
    if progress > MAX_PROGRESS {
        return Err(ValidationError::OutOfRange {
            field: "progress".to_string(),
            value: i64::from(progress),
            min: 0,
            max: i64::from(MAX_PROGRESS),
        });
    }
    Ok(())
}

impl TrackedEntity for TestRequest {
    type State = TestRequestState;

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> TestRequestState {
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

    fn write_state(&mut self, state: TestRequestState, _: TransitionToken) {
        self.status = state;
    }
}

impl Filterable for TestRequest {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["number", "product_name", "product_code", "supplier_name"];

    const FACETS: &'static [FacetDef] = &[
        FacetDef::choice("status", TestRequestState::is_canonical),
        FacetDef::choice("priority", Priority::is_canonical),
        FacetDef::choice("testing_level", TestingLevel::is_canonical),
        FacetDef::text("supplier_name"),
        FacetDef::choice("amendment", crate::core::filter::is_flag),
        FacetDef::choice("archived", crate::core::filter::is_flag),
        FacetDef::range("progress"),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "id" => FieldValue::Text(&self.id),
            "number" => FieldValue::Text(&self.number),
            "product_name" => FieldValue::Text(&self.product_name),
            "product_code" => FieldValue::Text(&self.product_code),
            "supplier_name" => FieldValue::Text(&self.supplier_name),
            "status" => FieldValue::Text(self.status.as_str()),
            "priority" => FieldValue::Text(self.priority.as_str()),
            "testing_level" => FieldValue::Text(self.testing_level.as_str()),
            "amendment" => FieldValue::flag(self.is_amendment),
            "archived" => FieldValue::Text(self.archive.facet_value()),
            "progress" => FieldValue::Number(i64::from(self.progress)),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_level_order() {
        assert!(TestingLevel::Base < TestingLevel::Bulk);
        assert!(TestingLevel::Bulk < TestingLevel::Garment);
    }

    #[test]
    fn test_state_names_round_trip() {
        for state in TestRequestState::ALL {
            assert_eq!(state.as_str().parse::<TestRequestState>().unwrap(), *state);
        }
        assert_eq!(
            "On-Hold".parse::<TestRequestState>().unwrap(),
            TestRequestState::OnHold
        );
    }

    #[test]
    fn test_set_progress_bounds() {
        let mut request = TestRequest::new("TR-1", "TR-2024-001");
        request.set_progress(100).unwrap();
        assert_eq!(request.progress, 100);

        let err = request.set_progress(101).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { value: 101, .. }));
        assert_eq!(request.progress, 100);
    }

    #[test]
    fn test_amend_links_back_to_parent() {
        let mut parent = TestRequest::new("TR-1", "TR-2024-001");
        parent.product_name = "Denim Jacket".to_string();
        parent.testing_level = TestingLevel::Bulk;
        parent.status = TestRequestState::Completed;
        parent.progress = 100;

        let amendment = parent.amend("TR-2", "TR-2024-001-A1");
        assert!(amendment.is_amendment);
        assert_eq!(amendment.parent_id.as_deref(), Some("TR-1"));
        assert_eq!(amendment.status, TestRequestState::Draft);
        assert_eq!(amendment.progress, 0);
        assert_eq!(amendment.product_name, "Denim Jacket");
        assert_eq!(amendment.testing_level, TestingLevel::Bulk);
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = r#"
id: TR-7
number: TR-2024-007
status: testing
due_date: 2024-06-01T00:00:00Z
"#;
        let request: TestRequest = serde_yml::from_str(yaml).unwrap();
        assert_eq!(request.status, TestRequestState::Testing);
        assert_eq!(request.priority, Priority::Normal);
        assert!(!request.archive.archived);
        assert!(request.due_date.is_some());
    }
}
