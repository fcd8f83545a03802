//! Record validation before submission
//!
//! Two independent checks: fibre composition totals, and required-field
//! completeness driven by a per-type declaration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::gate::{check_style_invariants, StageGateViolation};
use crate::entities::component::{Component, ComponentSpec, FibreEntry};
use crate::entities::style::Style;

/// Total every fibre composition must reach
pub const COMPOSITION_TOTAL: i64 = 100;

/// A fibre composition that cannot be submitted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("Composition totals {total}%, expected exactly 100%")]
    InvalidTotal { total: i64 },

    #[error("Entry {index} ({fibre_type}) has percentage {percentage}, expected 0-100")]
    OutOfRange {
        index: usize,
        fibre_type: String,
        percentage: i32,
    },
}

impl CompositionError {
    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            CompositionError::InvalidTotal { .. } => "invalid_total",
            CompositionError::OutOfRange { .. } => "out_of_range",
        }
    }
}

/// A required field absent at submission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Missing required field '{field}' for {record_type}")]
pub struct MissingField {
    pub record_type: String,
    pub field: String,
}

/// Any validation failure on a record
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    MissingField(#[from] MissingField),

    #[error("Field '{field}' is {value}, expected {min}-{max}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error(transparent)]
    Gate(#[from] StageGateViolation),
}

/// Check a fibre composition
///
/// Every entry must lie in 0-100 and the entries must sum to exactly 100.
/// Order does not matter and repeated fibre types are summed as separate
/// lines, not merged.
pub fn validate_composition(entries: &[FibreEntry]) -> Result<(), CompositionError> {
    if let Some((index, entry)) = entries
        .iter()
        .enumerate()
        .find(|(_, e)| !(0..=100).contains(&e.percentage))
    {
        return Err(CompositionError::OutOfRange {
            index,
            fibre_type: entry.fibre_type.clone(),
            percentage: entry.percentage,
        });
    }

    let total: i64 = entries.iter().map(|e| i64::from(e.percentage)).sum();
    if total != COMPOSITION_TOTAL {
        return Err(CompositionError::InvalidTotal { total });
    }
    Ok(())
}

/// A record whose fields can be checked for presence
pub trait Draft {
    /// Whether `name` holds a non-blank value
    fn has_field(&self, name: &str) -> bool;
}

impl Draft for BTreeMap<String, String> {
    fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.trim().is_empty())
    }
}

impl Draft for serde_json::Value {
    fn has_field(&self, name: &str) -> bool {
        match self.get(name) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(serde_json::Value::Array(a)) => !a.is_empty(),
            Some(serde_json::Value::Object(o)) => !o.is_empty(),
            Some(_) => true,
        }
    }
}

/// Required fields per record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredFields {
    by_type: BTreeMap<String, Vec<String>>,
}

impl Default for RequiredFields {
    fn default() -> Self {
        let mut fields = Self::empty();
        fields.declare("fabric", ["construction", "dye_method"]);
        fields.declare("trim", ["trim_type"]);
        fields.declare("style", ["name", "supplier_name"]);
        fields
    }
}

impl RequiredFields {
    /// No declarations at all
    pub fn empty() -> Self {
        Self {
            by_type: BTreeMap::new(),
        }
    }

    /// Declare (or replace) the required fields of a record type
    pub fn declare<I, S>(&mut self, record_type: &str, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_type.insert(
            record_type.to_string(),
            fields.into_iter().map(Into::into).collect(),
        );
    }

    /// Declared fields for a type; undeclared types require nothing
    pub fn fields_for(&self, record_type: &str) -> &[String] {
        self.by_type
            .get(record_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared record types
    pub fn record_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    /// First missing field, in declaration order
    pub fn validate<D: Draft + ?Sized>(&self, record_type: &str, draft: &D) -> Result<(), MissingField> {
        match self.fields_for(record_type).iter().find(|f| !draft.has_field(f)) {
            Some(field) => Err(MissingField {
                record_type: record_type.to_string(),
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Every missing field, in declaration order
    pub fn missing<D: Draft + ?Sized>(&self, record_type: &str, draft: &D) -> Vec<&str> {
        self.fields_for(record_type)
            .iter()
            .filter(|f| !draft.has_field(f))
            .map(String::as_str)
            .collect()
    }
}

/// Required fields for the component's type, then (fabric) its composition
pub fn validate_component(
    component: &Component,
    required: &RequiredFields,
) -> Result<(), ValidationError> {
    required.validate(component.component_type().as_str(), component)?;
    if let ComponentSpec::Fabric(fabric) = &component.spec {
        validate_composition(&fabric.composition)?;
    }
    Ok(())
}

/// Required style fields, then the status/stage/workbook invariant
pub fn validate_style(style: &Style, required: &RequiredFields) -> Result<(), ValidationError> {
    required.validate("style", style)?;
    check_style_invariants(style)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::style::{GswStatus, StyleStage};

    fn denim() -> Vec<FibreEntry> {
        vec![
            FibreEntry::new("cotton", 60).sustainable(),
            FibreEntry::new("cotton", 38).recycled(),
            FibreEntry::new("elastane", 2),
        ]
    }

    #[test]
    fn test_composition_exact_total() {
        assert!(validate_composition(&denim()).is_ok());

        let mut short = denim();
        short[2].percentage = 1;
        assert_eq!(
            validate_composition(&short),
            Err(CompositionError::InvalidTotal { total: 99 })
        );
        assert_eq!(
            validate_composition(&[]),
            Err(CompositionError::InvalidTotal { total: 0 })
        );
    }

    #[test]
    fn test_composition_entry_range() {
        let entries = vec![FibreEntry::new("cotton", 110), FibreEntry::new("polyester", -10)];
        let err = validate_composition(&entries).unwrap_err();
        assert_eq!(err.reason(), "out_of_range");
        assert!(matches!(err, CompositionError::OutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_single_fibre_hundred() {
        assert!(validate_composition(&[FibreEntry::new("linen", 100)]).is_ok());
    }

    #[test]
    fn test_required_fields_declaration_order() {
        let required = RequiredFields::default();
        let draft: BTreeMap<String, String> =
            [("dye_method".to_string(), "piece dyed".to_string())].into();

        assert_eq!(
            required.validate("fabric", &draft),
            Err(MissingField {
                record_type: "fabric".to_string(),
                field: "construction".to_string()
            })
        );
        assert_eq!(required.missing("fabric", &draft), vec!["construction"]);
        assert!(required.validate("lace", &draft).is_ok());
    }

    #[test]
    fn test_new_type_needs_only_a_declaration() {
        let mut required = RequiredFields::default();
        required.declare("label", ["care_symbols"]);
        let draft = serde_json::json!({ "care_symbols": ["wash_30"] });
        assert!(required.validate("label", &draft).is_ok());
        let blank = serde_json::json!({ "care_symbols": "  " });
        assert!(required.validate("label", &blank).is_err());
    }

    #[test]
    fn test_validate_component_checks_composition() {
        let required = RequiredFields::default();
        let mut fabric = Component::fabric("CMP-1", "Stretch Denim");
        if let Some(f) = fabric.as_fabric_mut() {
            f.construction = Some("3/1 twill".to_string());
            f.dye_method = Some("yarn dyed".to_string());
            f.composition = vec![FibreEntry::new("cotton", 98)];
        }
        assert!(matches!(
            validate_component(&fabric, &required),
            Err(ValidationError::Composition(CompositionError::InvalidTotal { total: 98 }))
        ));

        if let Some(f) = fabric.as_fabric_mut() {
            f.composition = denim();
        }
        assert!(validate_component(&fabric, &required).is_ok());
    }

    #[test]
    fn test_validate_trim_skips_composition() {
        let required = RequiredFields::default();
        let trim = Component::trim("CMP-2", "Shank Button");
        assert!(matches!(
            validate_component(&trim, &required),
            Err(ValidationError::MissingField(MissingField { ref field, .. })) if field == "trim_type"
        ));
    }

    #[test]
    fn test_validate_style_checks_invariant() {
        let required = RequiredFields::default();
        let mut style = Style::new("STY-1", "ST-88120");
        style.name = "Chore Jacket".to_string();
        style.supplier_name = "Lakeside Mills".to_string();
        assert!(validate_style(&style, &required).is_ok());

        style.stage = StyleStage::Bulk;
        style.gsw_status = GswStatus::Submitted;
        assert!(matches!(
            validate_style(&style, &required),
            Err(ValidationError::Gate(StageGateViolation::GswInconsistent { .. }))
        ));
    }

    #[test]
    fn test_required_fields_yaml() {
        let required: RequiredFields = serde_yml::from_str("trim: [trim_type, colour]\n").unwrap();
        assert_eq!(required.fields_for("trim"), ["trim_type", "colour"]);
        assert!(required.fields_for("fabric").is_empty());
    }
}
