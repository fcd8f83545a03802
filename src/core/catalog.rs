//! Catalog of entities supplied to the engine
//!
//! A catalog is plain YAML with one list per entity kind. It can be a single
//! file or a directory tree of files, merged in path order.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::validation::ValidationError;
use crate::entities::{Component, Inspection, Style, Supplier, TestRequest};
use crate::entities::test_request::check_progress;
use crate::yaml::{parse_yaml, YamlError};

/// Errors loading or checking a catalog
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("Failed to walk catalog directory: {0}")]
    #[diagnostic(code(tcm::catalog::walk))]
    Walk(#[from] walkdir::Error),

    #[error("Duplicate {kind} id '{id}'")]
    #[diagnostic(code(tcm::catalog::duplicate_id))]
    DuplicateId { kind: &'static str, id: String },

    #[error("Style {style} links unknown component '{component}'")]
    #[diagnostic(code(tcm::catalog::unknown_component))]
    UnknownComponent { style: String, component: String },

    #[error("Invalid {kind} '{id}': {source}")]
    #[diagnostic(code(tcm::catalog::invalid))]
    Invalid {
        kind: &'static str,
        id: String,
        #[source]
        source: ValidationError,
    },
}

/// Entities available to the engine, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub test_requests: Vec<TestRequest>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inspections: Vec<Inspection>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<Style>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suppliers: Vec<Supplier>,
}

impl Catalog {
    /// Load a catalog file, or every YAML file under a directory
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let catalog = if path.is_dir() {
            Self::load_dir(path)?
        } else {
            let content = std::fs::read_to_string(path).map_err(YamlError::from)?;
            Self::parse(&content, &path.display().to_string())?
        };
        catalog.validate()?;
        tracing::debug!(
            path = %path.display(),
            test_requests = catalog.test_requests.len(),
            inspections = catalog.inspections.len(),
            styles = catalog.styles.len(),
            components = catalog.components.len(),
            suppliers = catalog.suppliers.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Parse one catalog document (an empty document is an empty catalog)
    pub fn parse(content: &str, filename: &str) -> Result<Self, CatalogError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(parse_yaml(content, filename)?)
    }

    fn load_dir(root: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if !is_yaml {
                tracing::warn!(path = %path.display(), "skipping non-YAML file in catalog");
                continue;
            }
            let content = std::fs::read_to_string(path).map_err(YamlError::from)?;
            catalog.merge(Self::parse(&content, &path.display().to_string())?);
        }
        Ok(catalog)
    }

    /// Append every entity of `other`
    pub fn merge(&mut self, other: Catalog) {
        self.test_requests.extend(other.test_requests);
        self.inspections.extend(other.inspections);
        self.styles.extend(other.styles);
        self.components.extend(other.components);
        self.suppliers.extend(other.suppliers);
    }

    /// Check ids are unique per kind, stored values are in range and style
    /// links resolve
    pub fn validate(&self) -> Result<(), CatalogError> {
        unique_ids("test request", self.test_requests.iter().map(|r| r.id.as_str()))?;
        unique_ids("inspection", self.inspections.iter().map(|i| i.id.as_str()))?;
        unique_ids("style", self.styles.iter().map(|s| s.id.as_str()))?;
        unique_ids("component", self.components.iter().map(|c| c.id.as_str()))?;
        unique_ids("supplier", self.suppliers.iter().map(|s| s.id.as_str()))?;

        for request in &self.test_requests {
            check_progress(request.progress).map_err(|source| CatalogError::Invalid {
                kind: "test request",
                id: request.id.clone(),
                source,
            })?;
        }

        for style in &self.styles {
            if let Some(missing) = style
                .component_ids
                .iter()
                .find(|id| self.component(id).is_none())
            {
                return Err(CatalogError::UnknownComponent {
                    style: style.id.clone(),
                    component: missing.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn test_request(&self, id: &str) -> Option<&TestRequest> {
        self.test_requests.iter().find(|r| r.id == id)
    }

    pub fn inspection(&self, id: &str) -> Option<&Inspection> {
        self.inspections.iter().find(|i| i.id == id)
    }

    pub fn style(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn supplier(&self, id: &str) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| s.id == id)
    }

    /// Components linked to a style, in id order
    pub fn components_of(&self, style: &Style) -> Vec<&Component> {
        style
            .component_ids
            .iter()
            .filter_map(|id| self.component(id))
            .collect()
    }

    /// Styles linking a component
    pub fn styles_using(&self, component_id: &str) -> Vec<&Style> {
        self.styles
            .iter()
            .filter(|s| s.component_ids.contains(component_id))
            .collect()
    }

    /// Whether the catalog holds no entities
    pub fn is_empty(&self) -> bool {
        self.test_requests.is_empty()
            && self.inspections.is_empty()
            && self.styles.is_empty()
            && self.components.is_empty()
            && self.suppliers.is_empty()
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn unique_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
