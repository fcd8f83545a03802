//! YAML error types with source-annotated diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors that can occur when loading YAML
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error("Failed to read file: {0}")]
    #[diagnostic(code(tcm::yaml::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),
}

/// A YAML document that failed to parse or deserialize
#[derive(Debug, Error, Diagnostic)]
#[error("Invalid YAML in {filename}: {message}")]
#[diagnostic(code(tcm::yaml::syntax), help("check indentation and field names"))]
pub struct YamlSyntaxError {
    pub filename: String,
    pub message: String,
    /// 1-based line, when serde_yml reports one
    pub line: Option<usize>,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    /// Build from a serde_yml error, pointing at the reported location
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let location = err.location();
        let span = location.as_ref().map(|loc| {
            let offset = loc.index().min(content.len());
            let len = usize::from(offset < content.len());
            SourceSpan::from((offset, len))
        });

        // serde_yml appends " at line X column Y"; the label already shows it
        let full = err.to_string();
        let message = match full.find(" at line ") {
            Some(pos) if location.is_some() => full[..pos].to_string(),
            _ => full,
        };

        Self {
            filename: filename.to_string(),
            message,
            line: location.map(|loc| loc.line()),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_carries_location() {
        let content = "id: TR-1\nstatus: [unclosed\n";
        let err = serde_yml::from_str::<serde_yml::Value>(content).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, content, "requests.yaml");

        assert_eq!(diag.filename, "requests.yaml");
        assert!(diag.line.is_some());
        assert!(diag.to_string().starts_with("Invalid YAML in requests.yaml"));
    }
}
