//! `tcm transitions` command - Legal next states for a workflow

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::output::{effective_format, print_structured, Rows};
use crate::cli::{helpers, GlobalOpts, OutputFormat};
use crate::core::workflow::{AnyState, WorkflowKind, WorkflowRegistry};

#[derive(clap::Args, Debug)]
pub struct TransitionsArgs {
    /// Workflow kind (test-request, inspection, style-status, style-stage)
    pub kind: WorkflowKind,

    /// Current state; omit to show the whole workflow
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
struct StateReport {
    kind: WorkflowKind,
    state: &'static str,
    terminal: bool,
    next: Vec<&'static str>,
}

pub fn run(args: TransitionsArgs, global: &GlobalOpts) -> Result<()> {
    let engine = helpers::load_engine(global)?;
    let registry = engine.registry();

    let states = match &args.state {
        Some(value) => vec![WorkflowRegistry::parse_state(args.kind, value).into_diagnostic()?],
        None => WorkflowRegistry::states_of(args.kind),
    };
    let reports: Vec<StateReport> = states
        .into_iter()
        .map(|state| report(registry, args.kind, state))
        .collect();

    let format = effective_format(global.format, args.state.is_none());
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            if let [single] = reports.as_slice() {
                print_structured(single, format)?;
            } else {
                print_structured(&reports, format)?;
            }
        }
        OutputFormat::Id => {
            for report in &reports {
                for next in &report.next {
                    println!("{}", next);
                }
            }
        }
        OutputFormat::Table | OutputFormat::Tsv | OutputFormat::Auto => {
            let mut rows = Rows::new(["state", "next", "terminal"]);
            for report in &reports {
                rows.push(vec![
                    report.state.to_string(),
                    if report.next.is_empty() {
                        "-".to_string()
                    } else {
                        report.next.join(", ")
                    },
                    if report.terminal { "yes" } else { "no" }.to_string(),
                ]);
            }
            rows.print(format);

            if args.state.is_none() && format == OutputFormat::Table {
                let steps: Vec<&str> = registry
                    .steps(args.kind)
                    .iter()
                    .map(AnyState::as_str)
                    .collect();
                println!("{} {}", style("Steps:").bold(), steps.join(" → "));
            }
        }
    }
    Ok(())
}

fn report(registry: &WorkflowRegistry, kind: WorkflowKind, state: AnyState) -> StateReport {
    StateReport {
        kind,
        state: state.as_str(),
        terminal: registry.is_terminal_of(state),
        next: registry
            .legal_transitions_of(state)
            .iter()
            .map(AnyState::as_str)
            .collect(),
    }
}
