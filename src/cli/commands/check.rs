//! `tcm check` command - Validate records before submission

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{effective_format, print_structured, Rows};
use crate::cli::{helpers, GlobalOpts, OutputFormat};
use crate::core::validation::ValidationError;

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Catalog file or directory
    pub catalog: PathBuf,

    /// Only report failures
    #[arg(long)]
    pub failures_only: bool,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    record_type: &'static str,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckResult {
    fn new(record_type: &'static str, id: &str, result: std::result::Result<(), ValidationError>) -> Self {
        Self {
            record_type,
            id: id.to_string(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

pub fn run(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let engine = helpers::load_engine(global)?;
    let catalog = helpers::load_catalog(&args.catalog)?;

    let mut results: Vec<CheckResult> = Vec::new();
    for component in &catalog.components {
        let record_type = component.component_type().as_str();
        results.push(CheckResult::new(
            record_type,
            &component.id,
            engine.validate_component(component),
        ));
    }
    for style in &catalog.styles {
        results.push(CheckResult::new("style", &style.id, engine.validate_style(style)));
    }

    let checked = results.len();
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if args.failures_only {
        results.retain(|r| r.error.is_some());
    }

    let format = effective_format(global.format, true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&results, format)?,
        OutputFormat::Id => {
            for result in &results {
                println!("{}", result.id);
            }
        }
        OutputFormat::Table | OutputFormat::Tsv | OutputFormat::Auto => {
            if !results.is_empty() {
                let mut rows = Rows::new(["type", "id", "result"]);
                for result in &results {
                    rows.push(vec![
                        result.record_type.to_string(),
                        result.id.clone(),
                        result.error.clone().unwrap_or_else(|| "ok".to_string()),
                    ]);
                }
                rows.print(format);
            }
            if failed == 0 {
                println!("{} {} record(s) valid", style("✓").green(), checked);
            } else {
                println!("{} {} of {} record(s) failed", style("✗").red(), failed, checked);
            }
        }
    }

    if failed > 0 {
        return Err(miette::miette!("{} record(s) failed validation", failed));
    }
    Ok(())
}
