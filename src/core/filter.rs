//! Filter query evaluation for list views
//!
//! A [`FilterState`] is a free-text search plus any number of facets. Each
//! facet is either a set of accepted values (OR within the set, inactive when
//! empty) or an inclusive numeric range. An entity matches when the search
//! matches one of its searchable fields and every active facet passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// A field value exposed to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(i64),
}

impl FieldValue<'static> {
    /// Boolean flag as `"true"` / `"false"`
    pub fn flag(value: bool) -> Self {
        FieldValue::Text(if value { "true" } else { "false" })
    }
}

/// Accepted-value check for boolean facets
pub fn is_flag(value: &str) -> bool {
    value == "true" || value == "false"
}

/// How a facet compares values
#[derive(Debug, Clone, Copy)]
pub enum FacetKind {
    /// Closed set of values; the function accepts canonical names
    Choice(fn(&str) -> bool),
    /// Open set of values, compared exactly
    Text,
    /// Numeric, filtered by interval containment
    Range,
}

/// Declaration of one filterable dimension
#[derive(Debug, Clone, Copy)]
pub struct FacetDef {
    pub name: &'static str,
    pub kind: FacetKind,
}

impl FacetDef {
    pub const fn choice(name: &'static str, accepts: fn(&str) -> bool) -> Self {
        Self {
            name,
            kind: FacetKind::Choice(accepts),
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FacetKind::Text,
        }
    }

    pub const fn range(name: &'static str) -> Self {
        Self {
            name,
            kind: FacetKind::Range,
        }
    }
}

/// Something a list view can filter
pub trait Filterable {
    /// Fields the free-text search looks at
    const SEARCH_FIELDS: &'static [&'static str];

    /// Declared facets
    const FACETS: &'static [FacetDef];

    /// Look up a field by name
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Look up a facet declaration by name
    fn facet_def(name: &str) -> Option<FacetDef> {
        Self::FACETS.iter().find(|f| f.name == name).copied()
    }
}

/// Malformed filter (a programming error, not user input)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown facet '{facet}'")]
    UnknownFacet { facet: String },

    #[error("Invalid value '{value}' for facet '{facet}'")]
    InvalidValue { facet: String, value: String },

    #[error("Facet '{facet}' is a {expected} facet")]
    WrongFacetKind {
        facet: String,
        expected: &'static str,
    },

    #[error("Empty range for facet '{facet}': {min} > {max}")]
    EmptyRange { facet: String, min: i64, max: i64 },
}

/// A set-membership facet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    #[serde(default)]
    pub accepted: BTreeSet<String>,
}

/// An inclusive numeric interval; an open bound is unbounded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFacet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl RangeFacet {
    /// Whether `value` lies inside the interval
    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Whether both bounds are open
    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Filter state of a list view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Free-text search, case-insensitive
    #[serde(default)]
    pub search: String,

    /// Set-membership facets, evaluated in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    facets: Vec<Facet>,

    /// Range facets, evaluated after the set facets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ranges: Vec<RangeFacet>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text search
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Replace a facet's accepted values (position is kept if already declared)
    pub fn with_facet<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.set_facet(name, values);
        self
    }

    /// Set a range facet
    pub fn with_range(mut self, name: &str, min: Option<i64>, max: Option<i64>) -> Self {
        self.set_range(name, min, max);
        self
    }

    /// Replace a facet's accepted values
    pub fn set_facet<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let accepted: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        match self.facets.iter_mut().find(|f| f.name == name) {
            Some(facet) => facet.accepted = accepted,
            None => self.facets.push(Facet {
                name: name.to_string(),
                accepted,
            }),
        }
    }

    /// Add one accepted value to a facet
    pub fn accept(&mut self, name: &str, value: impl Into<String>) {
        match self.facets.iter_mut().find(|f| f.name == name) {
            Some(facet) => {
                facet.accepted.insert(value.into());
            }
            None => self.set_facet(name, [value.into()]),
        }
    }

    /// Deactivate a facet
    pub fn clear_facet(&mut self, name: &str) {
        if let Some(facet) = self.facets.iter_mut().find(|f| f.name == name) {
            facet.accepted.clear();
        }
    }

    /// Set or replace a range facet
    pub fn set_range(&mut self, name: &str, min: Option<i64>, max: Option<i64>) {
        match self.ranges.iter_mut().find(|r| r.name == name) {
            Some(range) => {
                range.min = min;
                range.max = max;
            }
            None => self.ranges.push(RangeFacet {
                name: name.to_string(),
                min,
                max,
            }),
        }
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn ranges(&self) -> &[RangeFacet] {
        &self.ranges
    }

    /// Whether nothing would be filtered out
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.facets.iter().all(|f| f.accepted.is_empty())
            && self.ranges.iter().all(RangeFacet::is_open)
    }

    /// Check every facet against `T`'s declarations
    pub fn validate<T: Filterable>(&self) -> Result<(), FilterError> {
        for facet in &self.facets {
            let def = T::facet_def(&facet.name).ok_or_else(|| FilterError::UnknownFacet {
                facet: facet.name.clone(),
            })?;
            match def.kind {
                FacetKind::Choice(accepts) => {
                    if let Some(bad) = facet.accepted.iter().find(|v| !accepts(v)) {
                        return Err(FilterError::InvalidValue {
                            facet: facet.name.clone(),
                            value: bad.clone(),
                        });
                    }
                }
                FacetKind::Text => {}
                FacetKind::Range => {
                    return Err(FilterError::WrongFacetKind {
                        facet: facet.name.clone(),
                        expected: "range",
                    })
                }
            }
        }
        for range in &self.ranges {
            let def = T::facet_def(&range.name).ok_or_else(|| FilterError::UnknownFacet {
                facet: range.name.clone(),
            })?;
            if !matches!(def.kind, FacetKind::Range) {
                return Err(FilterError::WrongFacetKind {
                    facet: range.name.clone(),
                    expected: "value",
                });
            }
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(FilterError::EmptyRange {
                        facet: range.name.clone(),
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Prepare for repeated evaluation
    pub fn query(&self) -> Query<'_> {
        let needle = self.search.trim();
        let numbers = self
            .facets
            .iter()
            .map(|facet| facet.accepted.iter().filter_map(|v| v.parse::<i64>().ok()).collect())
            .collect();
        Query {
            filter: self,
            needle: (!needle.is_empty()).then(|| needle.to_lowercase()),
            numbers,
        }
    }
}

/// A filter prepared for evaluation over many entities
#[derive(Debug, Clone)]
pub struct Query<'f> {
    filter: &'f FilterState,
    needle: Option<String>,
    /// Accepted values of each facet that parse as numbers, by facet position
    numbers: Vec<BTreeSet<i64>>,
}

impl Query<'_> {
    /// Whether `entity` passes the filter
    pub fn matches<T: Filterable + ?Sized>(&self, entity: &T) -> bool {
        if let Some(needle) = &self.needle {
            let found = T::SEARCH_FIELDS.iter().any(|name| match entity.field(name) {
                Some(FieldValue::Text(text)) => contains_folded(text, needle),
                _ => false,
            });
            if !found {
                return false;
            }
        }

        for (facet, numbers) in self.filter.facets.iter().zip(&self.numbers) {
            if facet.accepted.is_empty() {
                continue;
            }
            let passes = match entity.field(&facet.name) {
                Some(FieldValue::Text(text)) => facet.accepted.contains(text),
                Some(FieldValue::Number(n)) => numbers.contains(&n),
                None => false,
            };
            if !passes {
                return false;
            }
        }

        for range in &self.filter.ranges {
            if range.is_open() {
                continue;
            }
            match entity.field(&range.name) {
                Some(FieldValue::Number(n)) if range.contains(n) => {}
                _ => return false,
            }
        }

        true
    }

    /// The matching entities, in input order
    pub fn apply<'a, T: Filterable>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }
}

/// Whether `entity` passes `filter`
pub fn matches<T: Filterable + ?Sized>(entity: &T, filter: &FilterState) -> bool {
    filter.query().matches(entity)
}

/// The entities of `items` passing `filter`, in input order
pub fn apply<'a, T: Filterable>(items: &'a [T], filter: &FilterState) -> Vec<&'a T> {
    filter.query().apply(items)
}

/// Validate `filter` for `T`, then apply it
pub fn try_apply<'a, T: Filterable>(
    items: &'a [T],
    filter: &FilterState,
) -> Result<Vec<&'a T>, FilterError> {
    filter.validate::<T>()?;
    Ok(apply(items, filter))
}

/// Case-insensitive substring test against an already lowercased needle
fn contains_folded(haystack: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    if haystack.is_ascii() && needle_lower.is_ascii() {
        let (h, n) = (haystack.as_bytes(), needle_lower.as_bytes());
        return h.len() >= n.len() && h.windows(n.len()).any(|w| w.eq_ignore_ascii_case(n));
    }
    haystack.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        code: &'static str,
        colour: &'static str,
        size: i64,
    }

    impl Filterable for Row {
        const SEARCH_FIELDS: &'static [&'static str] = &["code"];
        const FACETS: &'static [FacetDef] = &[
            FacetDef::choice("colour", |v| matches!(v, "red" | "blue" | "green")),
            FacetDef::text("code"),
            FacetDef::range("size"),
        ];

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "code" => Some(FieldValue::Text(self.code)),
                "colour" => Some(FieldValue::Text(self.colour)),
                "size" => Some(FieldValue::Number(self.size)),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { code: "AB-100", colour: "red", size: 10 },
            Row { code: "ab-200", colour: "blue", size: 20 },
            Row { code: "CD-300", colour: "green", size: 30 },
        ]
    }

    fn codes(rows: &[&Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.code).collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let rows = rows();
        let filter = FilterState::new().with_search("Ab-");
        assert_eq!(codes(&apply(&rows, &filter)), vec!["AB-100", "ab-200"]);
    }

    #[test]
    fn test_blank_search_matches_everything() {
        let rows = rows();
        let filter = FilterState::new().with_search("   ");
        assert_eq!(apply(&rows, &filter).len(), 3);
    }

    #[test]
    fn test_or_within_and_across_facets() {
        let rows = rows();
        let filter = FilterState::new()
            .with_facet("colour", ["red", "green"])
            .with_range("size", Some(15), None);
        assert_eq!(codes(&apply(&rows, &filter)), vec!["CD-300"]);
    }

    #[test]
    fn test_numeric_field_as_value_facet() {
        let rows = rows();
        let filter = FilterState::new().with_facet("size", ["10", "30", "large"]);
        let query = filter.query();
        assert_eq!(codes(&query.apply(&rows)), vec!["AB-100", "CD-300"]);

        let none = FilterState::new().with_facet("size", ["large"]);
        assert!(apply(&rows, &none).is_empty());
    }

    #[test]
    fn test_empty_facet_is_inactive() {
        let rows = rows();
        let mut filter = FilterState::new().with_facet("colour", ["red"]);
        assert_eq!(apply(&rows, &filter).len(), 1);
        filter.clear_facet("colour");
        assert_eq!(apply(&rows, &filter).len(), 3);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_accept_keeps_declaration_position() {
        let mut filter = FilterState::new()
            .with_facet("colour", ["red"])
            .with_facet("code", ["AB-100"]);
        filter.accept("colour", "blue");
        let names: Vec<&str> = filter.facets().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["colour", "code"]);
        assert_eq!(filter.facets()[0].accepted.len(), 2);
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let range = RangeFacet {
            name: "size".to_string(),
            min: Some(10),
            max: Some(20),
        };
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
    }

    #[test]
    fn test_unknown_field_fails_active_facet() {
        let rows = rows();
        let filter = FilterState::new().with_facet("weight", ["heavy"]);
        assert!(apply(&rows, &filter).is_empty());
    }

    #[test]
    fn test_validate_reports_programming_errors() {
        assert_eq!(
            FilterState::new().with_facet("weight", ["x"]).validate::<Row>(),
            Err(FilterError::UnknownFacet {
                facet: "weight".to_string()
            })
        );
        assert_eq!(
            FilterState::new().with_facet("colour", ["purple"]).validate::<Row>(),
            Err(FilterError::InvalidValue {
                facet: "colour".to_string(),
                value: "purple".to_string()
            })
        );
        assert!(matches!(
            FilterState::new().with_facet("size", ["1"]).validate::<Row>(),
            Err(FilterError::WrongFacetKind { .. })
        ));
        assert!(matches!(
            FilterState::new()
                .with_range("size", Some(5), Some(1))
                .validate::<Row>(),
            Err(FilterError::EmptyRange { .. })
        ));
        assert!(FilterState::new()
            .with_facet("colour", ["red"])
            .with_range("size", None, Some(5))
            .validate::<Row>()
            .is_ok());
    }

    #[test]
    fn test_try_apply() {
        let rows = rows();
        let bad = FilterState::new().with_facet("colour", ["purple"]);
        assert!(try_apply(&rows, &bad).is_err());
        let good = FilterState::new().with_facet("colour", ["blue"]);
        assert_eq!(codes(&try_apply(&rows, &good).unwrap()), vec!["ab-200"]);
    }

    #[test]
    fn test_contains_folded_unicode() {
        assert!(contains_folded("Baumwolle GRÜN", "grün"));
        assert!(!contains_folded("Baumwolle", "grün"));
        assert!(contains_folded("anything", ""));
    }
}
