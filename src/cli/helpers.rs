//! Shared helper functions for CLI commands

use chrono::{DateTime, NaiveDate, Utc};
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::{Catalog, Engine, EngineConfig};

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a reference time: RFC 3339, or a date meaning midnight UTC
pub fn parse_as_of(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("'{}' is not an RFC 3339 timestamp or YYYY-MM-DD date", value))
}

/// Reference time from `--as-of`, defaulting to now
pub fn reference_time(as_of: Option<DateTime<Utc>>) -> DateTime<Utc> {
    as_of.unwrap_or_else(Utc::now)
}

/// Build the engine from discovered configuration
pub fn load_engine(global: &GlobalOpts) -> Result<Engine> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let config = EngineConfig::discover(global.config.as_deref(), &cwd)?;
    Ok(Engine::new(config))
}

/// Load a catalog file or directory
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(miette::miette!("Catalog not found: {}", path.display()));
    }
    Ok(Catalog::load(path)?)
}

/// Display a due date as a calendar date
pub fn format_due(due: Option<DateTime<Utc>>) -> String {
    due.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Baumwolle grün", 9), "Baumwo...");
    }

    #[test]
    fn test_parse_as_of() {
        assert_eq!(
            parse_as_of("2024-05-10").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_as_of("2024-05-10T12:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 10, 10, 30, 0).unwrap()
        );
        assert!(parse_as_of("next tuesday").is_err());
    }

    #[test]
    fn test_format_due() {
        assert_eq!(format_due(None), "-");
        let due = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        assert_eq!(format_due(Some(due)), "2024-06-01");
    }
}
