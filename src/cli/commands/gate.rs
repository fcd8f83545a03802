//! `tcm gate` command - Stage gate report for styles

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::truncate_str;
use crate::cli::output::{effective_format, print_structured, Rows};
use crate::cli::{helpers, GlobalOpts, OutputFormat};
use crate::core::gate::{check_style_invariants, StageGate};
use crate::entities::style::{GswStatus, Style, StyleStage, StyleStatus};

#[derive(clap::Args, Debug)]
pub struct GateArgs {
    /// Catalog file or directory
    pub catalog: PathBuf,

    /// Report a single style
    pub style_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct GateReport {
    id: String,
    style_number: String,
    stage: StyleStage,
    status: StyleStatus,
    gsw_status: GswStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_stage: Option<StyleStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_by: Option<String>,
    can_upload_gsw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    invariant_violation: Option<String>,
}

pub fn run(args: GateArgs, global: &GlobalOpts) -> Result<()> {
    let engine = helpers::load_engine(global)?;
    let catalog = helpers::load_catalog(&args.catalog)?;
    let gate = engine.stage_gate();

    let styles: Vec<&Style> = match &args.style_id {
        Some(id) => vec![catalog
            .style(id)
            .ok_or_else(|| miette::miette!("Style not found: {}", id))?],
        None => catalog.styles.iter().collect(),
    };

    let reports: Vec<GateReport> = styles.iter().map(|s| report(&gate, s)).collect();

    let format = effective_format(global.format, args.style_id.is_none());
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            if let [single] = reports.as_slice() {
                print_structured(single, format)?;
            } else {
                print_structured(&reports, format)?;
            }
        }
        OutputFormat::Id => {
            for report in reports.iter().filter(|r| r.next_stage.is_some()) {
                println!("{}", report.id);
            }
        }
        OutputFormat::Table | OutputFormat::Tsv | OutputFormat::Auto => {
            if reports.is_empty() {
                println!("No styles found.");
                return Ok(());
            }
            let mut rows = Rows::new(["id", "stage", "status", "gsw", "advance", "gsw upload"]);
            for report in &reports {
                let advance = match (report.next_stage, &report.blocked_by) {
                    (Some(next), _) => format!("→ {}", next),
                    (None, Some(reason)) => truncate_str(reason, 48),
                    (None, None) => "-".to_string(),
                };
                rows.push(vec![
                    report.id.clone(),
                    report.stage.to_string(),
                    report.status.to_string(),
                    report.gsw_status.to_string(),
                    advance,
                    if report.can_upload_gsw { "ready" } else { "-" }.to_string(),
                ]);
            }
            rows.print(format);

            for report in reports.iter().filter(|r| r.invariant_violation.is_some()) {
                if let Some(violation) = &report.invariant_violation {
                    eprintln!("{} {}: {}", style("!").red().bold(), report.id, violation);
                }
            }
        }
    }
    Ok(())
}

fn report(gate: &StageGate<'_>, style: &Style) -> GateReport {
    let (next_stage, blocked_by) = match gate.next_stage(style) {
        Ok(next) => (Some(next), None),
        Err(violation) => (None, Some(violation.to_string())),
    };
    GateReport {
        id: style.id.clone(),
        style_number: style.style_number.clone(),
        stage: style.stage,
        status: style.status,
        gsw_status: style.gsw_status,
        next_stage,
        blocked_by,
        can_upload_gsw: gate.can_upload_gsw(style),
        invariant_violation: check_style_invariants(style).err().map(|e| e.to_string()),
    }
}
