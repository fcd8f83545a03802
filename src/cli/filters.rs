//! Filter arguments for list commands
//!
//! Facets are given as `--facet name=value[,value...]` and ranges as
//! `--range name=min..max` with either bound optional.

use crate::core::filter::FilterState;

named_enum! {
    /// Entity kind selectable on the command line
    pub enum EntityKind {
        TestRequest => "test_request",
        Inspection => "inspection",
        Style => "style",
        Component => "component",
        Supplier => "supplier",
    }
}

/// A parsed `--facet` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetArg {
    pub name: String,
    pub values: Vec<String>,
}

impl std::str::FromStr for FacetArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, values) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=value[,value...], got '{}'", s))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing facet name in '{}'", s));
        }
        let values = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            name: name.to_string(),
            values,
        })
    }
}

/// A parsed `--range` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeArg {
    pub name: String,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl std::str::FromStr for RangeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, bounds) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=min..max, got '{}'", s))?;
        let (min, max) = bounds
            .split_once("..")
            .ok_or_else(|| format!("expected min..max, got '{}'", bounds))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing range name in '{}'", s));
        }
        Ok(Self {
            name: name.to_string(),
            min: parse_bound(min)?,
            max: parse_bound(max)?,
        })
    }
}

fn parse_bound(value: &str) -> Result<Option<i64>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| format!("'{}' is not an integer", value))
}

/// Build a filter from command-line pieces, in argument order
pub fn build_filter(search: Option<&str>, facets: &[FacetArg], ranges: &[RangeArg]) -> FilterState {
    let mut filter = FilterState::new().with_search(search.unwrap_or_default());
    for facet in facets {
        for value in &facet.values {
            filter.accept(&facet.name, value.as_str());
        }
    }
    for range in ranges {
        filter.set_range(&range.name, range.min, range.max);
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_accepts_dashes() {
        assert_eq!("test-request".parse::<EntityKind>().unwrap(), EntityKind::TestRequest);
        assert_eq!("Style".parse::<EntityKind>().unwrap(), EntityKind::Style);
    }

    #[test]
    fn test_parse_facet() {
        let facet: FacetArg = "status=testing, on_hold".parse().unwrap();
        assert_eq!(facet.name, "status");
        assert_eq!(facet.values, vec!["testing", "on_hold"]);
        assert!("status".parse::<FacetArg>().is_err());
        assert!("=x".parse::<FacetArg>().is_err());
    }

    #[test]
    fn test_parse_range() {
        let range: RangeArg = "progress=10..".parse().unwrap();
        assert_eq!((range.min, range.max), (Some(10), None));
        let range: RangeArg = "due_in_days=-5..0".parse().unwrap();
        assert_eq!((range.min, range.max), (Some(-5), Some(0)));
        assert!("progress=ten..20".parse::<RangeArg>().is_err());
        assert!("progress=10".parse::<RangeArg>().is_err());
    }

    #[test]
    fn test_repeated_facets_merge() {
        let facets = vec![
            "status=testing".parse().unwrap(),
            "status=on_hold".parse().unwrap(),
        ];
        let filter = build_filter(Some("denim"), &facets, &[]);
        assert_eq!(filter.search, "denim");
        assert_eq!(filter.facets().len(), 1);
        assert_eq!(filter.facets()[0].accepted.len(), 2);
    }
}
