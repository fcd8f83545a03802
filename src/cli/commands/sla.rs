//! `tcm sla` command - Live SLA badges

use chrono::{DateTime, Utc};
use console::style;
use miette::Result;
use serde::Serialize;
use std::cmp::Reverse;
use std::path::PathBuf;

use crate::cli::output::{effective_format, print_structured, Rows};
use crate::cli::{helpers, GlobalOpts, OutputFormat};
use crate::core::entity::{NamedEnum, TrackedEntity};
use crate::core::filter::{FilterState, Filterable};
use crate::core::sla::{SlaStatus, SlaSummary};
use crate::core::workflow::{WorkflowKind, WorkflowState};
use crate::core::Engine;

#[derive(clap::Args, Debug)]
pub struct SlaArgs {
    /// Catalog file or directory
    pub catalog: PathBuf,

    /// Reference time, RFC 3339 or YYYY-MM-DD (default: now)
    #[arg(long, value_parser = helpers::parse_as_of)]
    pub as_of: Option<DateTime<Utc>>,

    /// Only these workflow kinds (test_request, inspection, style_status)
    #[arg(long, value_delimiter = ',')]
    pub kind: Vec<WorkflowKind>,

    /// Only these badges (on_track, at_risk, overdue)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<SlaStatus>,

    /// Print badge counts only
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Serialize)]
struct SlaRow {
    kind: WorkflowKind,
    id: String,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_in_days: Option<i64>,
    sla: Option<SlaStatus>,
}

pub fn run(args: SlaArgs, global: &GlobalOpts) -> Result<()> {
    // Stages have no due date of their own; the style deadline is reported under style_status
    if args.kind.contains(&WorkflowKind::StyleStage) {
        return Err(miette::miette!(
            help = "use --kind style_status for style deadlines",
            "No SLA is tracked for style_stage"
        ));
    }

    let engine = helpers::load_engine(global)?;
    let catalog = helpers::load_catalog(&args.catalog)?;
    let now = helpers::reference_time(args.as_of);

    // Terminal entities carry no badge and are never listed
    let badges = if args.only.is_empty() {
        SlaStatus::ALL.to_vec()
    } else {
        args.only.clone()
    };
    let filter = FilterState::new().with_facet("sla", badges.iter().map(|b| b.as_str()));

    let wanted = |kind: WorkflowKind| args.kind.is_empty() || args.kind.contains(&kind);
    let mut rows = Vec::new();
    let mut summary = SlaSummary::default();

    if wanted(WorkflowKind::TestRequest) {
        collect(&engine, &catalog.test_requests, now, &filter, &mut rows, &mut summary);
    }
    if wanted(WorkflowKind::Inspection) {
        collect(&engine, &catalog.inspections, now, &filter, &mut rows, &mut summary);
    }
    if wanted(WorkflowKind::StyleStatus) {
        collect(&engine, &catalog.styles, now, &filter, &mut rows, &mut summary);
    }

    rows.sort_by_key(|r| (Reverse(r.sla), r.due_in_days.unwrap_or(i64::MAX)));

    let format = effective_format(global.format, true);
    if args.summary {
        return match format {
            OutputFormat::Json | OutputFormat::Yaml => print_structured(&summary, format),
            _ => {
                print_summary(&summary);
                Ok(())
            }
        };
    }

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&rows, format)?,
        OutputFormat::Id => {
            for row in &rows {
                println!("{}", row.id);
            }
        }
        OutputFormat::Table | OutputFormat::Tsv | OutputFormat::Auto => {
            if rows.is_empty() {
                println!("No tracked entities match.");
            } else {
                let mut table = Rows::new(["kind", "id", "state", "due", "days", "sla"]);
                for row in &rows {
                    table.push(vec![
                        row.kind.to_string(),
                        row.id.clone(),
                        row.state.to_string(),
                        helpers::format_due(row.due_date),
                        row.due_in_days.map_or_else(|| "-".to_string(), |d| d.to_string()),
                        row.sla.map_or("n/a", |s| s.as_str()).to_string(),
                    ]);
                }
                table.print(format);
            }
            if format == OutputFormat::Table {
                print_summary(&summary);
            }
        }
    }
    Ok(())
}

fn collect<T: TrackedEntity + Filterable>(
    engine: &Engine,
    items: &[T],
    now: DateTime<Utc>,
    filter: &FilterState,
    rows: &mut Vec<SlaRow>,
    summary: &mut SlaSummary,
) {
    let classified = engine.classify_all(items, now);
    let counts = SlaSummary::from_statuses(classified.iter().map(|c| c.sla));
    summary.on_track += counts.on_track;
    summary.at_risk += counts.at_risk;
    summary.overdue += counts.overdue;
    summary.not_applicable += counts.not_applicable;

    let kind = <T::State as WorkflowState>::KIND;
    for entry in filter.query().apply(&classified) {
        rows.push(SlaRow {
            kind,
            id: entry.entity.id().to_string(),
            state: entry.entity.state().as_str(),
            due_date: entry.entity.due_date(),
            due_in_days: entry.due_in_days,
            sla: entry.sla,
        });
    }
}

fn print_summary(summary: &SlaSummary) {
    println!(
        "{} overdue, {} at risk, {} on track ({} closed)",
        style(summary.overdue).red().bold(),
        style(summary.at_risk).yellow().bold(),
        style(summary.on_track).green(),
        summary.not_applicable
    );
}
