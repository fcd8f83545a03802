//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Rows of text cells under a header
#[derive(Debug, Clone, Default)]
pub struct Rows {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Rows {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Render as a bordered table
    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| h.to_uppercase()));
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }
        let mut table = builder.build();
        table.with(Style::sharp());
        table.to_string()
    }

    /// Render as tab-separated values with a header line
    pub fn to_tsv(&self) -> String {
        let mut out = self.headers.join("\t").to_uppercase();
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }

    /// Print as a table or TSV; other formats are handled by the caller
    pub fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Tsv => print!("{}", self.to_tsv()),
            _ => println!("{}", self.to_table()),
        }
    }
}

/// Print a serializable value as YAML or JSON
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Table);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Json, true), OutputFormat::Json);
    }

    #[test]
    fn test_tsv() {
        let mut rows = Rows::new(["id", "status"]);
        rows.push(vec!["TR-1".to_string(), "testing".to_string()]);
        assert_eq!(rows.to_tsv(), "ID\tSTATUS\nTR-1\ttesting\n");
    }

    #[test]
    fn test_table_contains_cells() {
        let mut rows = Rows::new(["id"]);
        rows.push(vec!["TR-1".to_string()]);
        let table = rows.to_table();
        assert!(table.contains("ID"));
        assert!(table.contains("TR-1"));
    }
}
