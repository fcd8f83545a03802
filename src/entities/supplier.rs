//! Supplier entity type - Mills, factories and trim vendors

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::entity::{Archive, NamedEnum};
use crate::core::filter::{is_flag, FacetDef, FieldValue, Filterable};

named_enum! {
    /// Onboarding status of a supplier
    #[derive(Default)]
    pub enum SupplierStatus {
        Active => "active",
        #[default]
        Pending => "pending",
        Suspended => "suspended",
    }
}

named_enum! {
    /// What a supplier provides
    pub enum SupplierCategory {
        Mill => "mill",
        Factory => "factory",
        TrimVendor => "trim_vendor",
        Laboratory => "laboratory",
    }
}

/// Compliance certification held by a supplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    /// Certification name (e.g., "OEKO-TEX Standard 100", "GOTS")
    pub name: String,

    /// Expiration date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<NaiveDate>,
}

/// A supplier of components or finished goods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    /// Unique identifier
    pub id: String,

    /// Supplier code (e.g., "SUP-0042")
    #[serde(default)]
    pub code: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default)]
    pub status: SupplierStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<SupplierCategory>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<Certification>,

    #[serde(flatten)]
    pub archive: Archive,
}

impl Supplier {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: String::new(),
            name: name.into(),
            country: None,
            status: SupplierStatus::default(),
            categories: Vec::new(),
            certifications: Vec::new(),
            archive: Archive::default(),
        }
    }

    /// Certifications expiring on or before `on`
    pub fn expired_certifications(&self, on: NaiveDate) -> Vec<&Certification> {
        self.certifications
            .iter()
            .filter(|c| c.expiry.is_some_and(|e| e <= on))
            .collect()
    }
}

impl Filterable for Supplier {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "code", "country"];

    const FACETS: &'static [FacetDef] = &[
        FacetDef::choice("status", SupplierStatus::is_canonical),
        FacetDef::text("country"),
        FacetDef::choice("archived", is_flag),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "id" => FieldValue::Text(&self.id),
            "name" => FieldValue::Text(&self.name),
            "code" => FieldValue::Text(&self.code),
            "country" => FieldValue::Text(self.country.as_deref()?),
            "status" => FieldValue::Text(self.status.as_str()),
            "archived" => FieldValue::Text(self.archive.facet_value()),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_certifications() {
        let mut supplier = Supplier::new("SUP-1", "Lakeside Mills");
        supplier.certifications = vec![
            Certification {
                name: "GOTS".to_string(),
                expiry: NaiveDate::from_ymd_opt(2024, 3, 1),
            },
            Certification {
                name: "OEKO-TEX Standard 100".to_string(),
                expiry: NaiveDate::from_ymd_opt(2025, 3, 1),
            },
            Certification {
                name: "BSCI".to_string(),
                expiry: None,
            },
        ];

        let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let expired = supplier.expired_certifications(on);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name, "GOTS");
    }

    #[test]
    fn test_supplier_yaml() {
        let yaml = r#"
id: SUP-1
name: Lakeside Mills
country: Portugal
status: active
categories: [mill, trim_vendor]
"#;
        let supplier: Supplier = serde_yml::from_str(yaml).unwrap();
        assert_eq!(supplier.status, SupplierStatus::Active);
        assert_eq!(
            supplier.categories,
            vec![SupplierCategory::Mill, SupplierCategory::TrimVendor]
        );
    }
}
