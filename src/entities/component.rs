//! Component entity type - Fabrics and trims used by styles

use serde::{Deserialize, Serialize};

use crate::core::entity::{Archive, NamedEnum};
use crate::core::filter::{is_flag, FacetDef, FieldValue, Filterable};
use crate::core::validation::Draft;

named_enum! {
    /// Component type discriminant
    pub enum ComponentType {
        Fabric => "fabric",
        Trim => "trim",
    }
}

/// One line of a fabric's fibre composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibreEntry {
    /// Fibre name (e.g., "cotton", "elastane")
    pub fibre_type: String,

    /// Whole-number percentage of the blend
    pub percentage: i32,

    #[serde(default)]
    pub is_sustainable: bool,

    #[serde(default)]
    pub is_recycled: bool,
}

impl FibreEntry {
    /// Conventional fibre line
    pub fn new(fibre_type: impl Into<String>, percentage: i32) -> Self {
        Self {
            fibre_type: fibre_type.into(),
            percentage,
            is_sustainable: false,
            is_recycled: false,
        }
    }

    /// Mark as sustainably sourced
    pub fn sustainable(mut self) -> Self {
        self.is_sustainable = true;
        self
    }

    /// Mark as recycled
    pub fn recycled(mut self) -> Self {
        self.is_recycled = true;
        self
    }
}

/// Woven or knitted material
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fabric {
    /// Fibre blend, in the order it was entered
    #[serde(default)]
    pub composition: Vec<FibreEntry>,

    /// Construction (e.g., "3/1 twill", "single jersey")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<String>,

    /// Dyeing method (e.g., "piece dyed", "yarn dyed")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dye_method: Option<String>,

    /// Weight in grams per square metre
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_gsm: Option<u32>,
}

impl Fabric {
    /// Percentage points of the blend flagged sustainable
    pub fn sustainable_share(&self) -> i64 {
        self.composition
            .iter()
            .filter(|e| e.is_sustainable)
            .map(|e| i64::from(e.percentage))
            .sum()
    }

    /// Percentage points of the blend flagged recycled
    pub fn recycled_share(&self) -> i64 {
        self.composition
            .iter()
            .filter(|e| e.is_recycled)
            .map(|e| i64::from(e.percentage))
            .sum()
    }
}

/// Buttons, zips, labels and other accessories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trim {
    /// Trim type (e.g., "button", "zip", "care label")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

/// Type-specific payload of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentSpec {
    Fabric(Fabric),
    Trim(Trim),
}

impl ComponentSpec {
    /// The discriminant of this payload
    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentSpec::Fabric(_) => ComponentType::Fabric,
            ComponentSpec::Trim(_) => ComponentType::Trim,
        }
    }
}

/// A fabric or trim supplied for use in styles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier
    pub id: String,

    /// Supplier or internal material code
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub supplier_name: String,

    #[serde(flatten)]
    pub spec: ComponentSpec,

    #[serde(flatten)]
    pub archive: Archive,
}

impl Component {
    /// Create a fabric with an empty composition
    pub fn fabric(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_spec(id, name, ComponentSpec::Fabric(Fabric::default()))
    }

    /// Create a trim with no attributes set
    pub fn trim(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_spec(id, name, ComponentSpec::Trim(Trim::default()))
    }

    fn with_spec(id: impl Into<String>, name: impl Into<String>, spec: ComponentSpec) -> Self {
        Self {
            id: id.into(),
            code: String::new(),
            name: name.into(),
            supplier_name: String::new(),
            spec,
            archive: Archive::default(),
        }
    }

    pub fn component_type(&self) -> ComponentType {
        self.spec.component_type()
    }

    /// The fabric payload, if this is a fabric
    pub fn as_fabric(&self) -> Option<&Fabric> {
        match &self.spec {
            ComponentSpec::Fabric(fabric) => Some(fabric),
            ComponentSpec::Trim(_) => None,
        }
    }

    /// Mutable fabric payload, if this is a fabric
    pub fn as_fabric_mut(&mut self) -> Option<&mut Fabric> {
        match &mut self.spec {
            ComponentSpec::Fabric(fabric) => Some(fabric),
            ComponentSpec::Trim(_) => None,
        }
    }

    /// The trim payload, if this is a trim
    pub fn as_trim(&self) -> Option<&Trim> {
        match &self.spec {
            ComponentSpec::Trim(trim) => Some(trim),
            ComponentSpec::Fabric(_) => None,
        }
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Draft for Component {
    fn has_field(&self, name: &str) -> bool {
        match (name, &self.spec) {
            ("id", _) => !self.id.trim().is_empty(),
            ("code", _) => !self.code.trim().is_empty(),
            ("name", _) => !self.name.trim().is_empty(),
            ("supplier_name", _) => !self.supplier_name.trim().is_empty(),
            ("composition", ComponentSpec::Fabric(f)) => !f.composition.is_empty(),
            ("construction", ComponentSpec::Fabric(f)) => present(&f.construction),
            ("dye_method", ComponentSpec::Fabric(f)) => present(&f.dye_method),
            ("weight_gsm", ComponentSpec::Fabric(f)) => f.weight_gsm.is_some(),
            ("trim_type", ComponentSpec::Trim(t)) => present(&t.trim_type),
            ("material", ComponentSpec::Trim(t)) => present(&t.material),
            ("colour", ComponentSpec::Trim(t)) => present(&t.colour),
            _ => false,
        }
    }
}

impl Filterable for Component {
    const SEARCH_FIELDS: &'static [&'static str] = &["code", "name", "supplier_name"];

    const FACETS: &'static [FacetDef] = &[
        FacetDef::choice("type", ComponentType::is_canonical),
        FacetDef::text("supplier_name"),
        FacetDef::text("construction"),
        FacetDef::text("trim_type"),
        FacetDef::choice("archived", is_flag),
        FacetDef::range("sustainable_share"),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "id" => FieldValue::Text(&self.id),
            "code" => FieldValue::Text(&self.code),
            "name" => FieldValue::Text(&self.name),
            "supplier_name" => FieldValue::Text(&self.supplier_name),
            "type" => FieldValue::Text(self.component_type().as_str()),
            "construction" => FieldValue::Text(self.as_fabric()?.construction.as_deref()?),
            "trim_type" => FieldValue::Text(self.as_trim()?.trim_type.as_deref()?),
            "archived" => FieldValue::Text(self.archive.facet_value()),
            "sustainable_share" => FieldValue::Number(self.as_fabric()?.sustainable_share()),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fabric_yaml_tagged_by_type() {
        let yaml = r#"
id: CMP-1
code: F-2201
name: Stretch Denim
type: fabric
construction: 3/1 twill
composition:
  - { fibre_type: cotton, percentage: 60, is_sustainable: true }
  - { fibre_type: cotton, percentage: 38, is_recycled: true }
  - { fibre_type: elastane, percentage: 2 }
"#;
        let component: Component = serde_yml::from_str(yaml).unwrap();
        assert_eq!(component.component_type(), ComponentType::Fabric);
        let fabric = component.as_fabric().unwrap();
        assert_eq!(fabric.composition.len(), 3);
        assert_eq!(fabric.sustainable_share(), 60);
        assert_eq!(fabric.recycled_share(), 38);
        assert!(component.as_trim().is_none());
    }

    #[test]
    fn test_trim_yaml() {
        let yaml = r#"
id: CMP-2
name: Shank Button
type: trim
trim_type: button
"#;
        let component: Component = serde_yml::from_str(yaml).unwrap();
        assert_eq!(component.component_type(), ComponentType::Trim);
        assert!(component.has_field("trim_type"));
        assert!(!component.has_field("material"));
    }

    #[test]
    fn test_draft_fields_are_type_specific() {
        let mut fabric = Component::fabric("CMP-1", "Poplin");
        assert!(!fabric.has_field("construction"));
        assert!(!fabric.has_field("trim_type"));

        if let Some(f) = fabric.as_fabric_mut() {
            f.construction = Some("plain weave".to_string());
            f.dye_method = Some("  ".to_string());
        }
        assert!(fabric.has_field("construction"));
        assert!(!fabric.has_field("dye_method"));
    }
}
