//! `tcm list` command - List and filter entities

use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::cli::filters::{build_filter, EntityKind, FacetArg, RangeArg};
use crate::cli::helpers::truncate_str;
use crate::cli::output::{effective_format, print_structured, Rows};
use crate::cli::{helpers, GlobalOpts, OutputFormat};
use crate::core::filter::{try_apply, FieldValue, FilterState, Filterable};
use crate::core::sla::Classified;
use crate::core::EngineError;

#[derive(clap::Args, Debug)]
#[command(after_help = "Tracked kinds (test-request, inspection, style) also accept the \
derived facets `sla` (on_track, at_risk, overdue, n/a) and `due_in_days` (range).")]
pub struct ListArgs {
    /// Entity kind (test-request, inspection, style, component, supplier)
    pub kind: EntityKind,

    /// Catalog file or directory
    pub catalog: PathBuf,

    /// Case-insensitive search over the kind's text fields
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Accept values for a facet (repeatable): name=value[,value...]
    #[arg(long = "facet", value_name = "NAME=VALUES")]
    pub facets: Vec<FacetArg>,

    /// Numeric range for a facet (repeatable): name=min..max
    #[arg(long = "range", value_name = "NAME=MIN..MAX")]
    pub ranges: Vec<RangeArg>,

    /// Reference time for SLA facets, RFC 3339 or YYYY-MM-DD (default: now)
    #[arg(long, value_parser = helpers::parse_as_of)]
    pub as_of: Option<DateTime<Utc>>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

const TEST_REQUEST_COLUMNS: &[&str] = &[
    "id",
    "number",
    "product_name",
    "status",
    "priority",
    "progress",
    "sla",
    "due_in_days",
];

const INSPECTION_COLUMNS: &[&str] = &[
    "id",
    "number",
    "supplier_name",
    "status",
    "result",
    "total_defects",
    "sla",
    "due_in_days",
];

const STYLE_COLUMNS: &[&str] = &["id", "style_number", "name", "stage", "status", "gsw_status", "sla"];

const COMPONENT_COLUMNS: &[&str] = &["id", "code", "name", "type", "supplier_name", "sustainable_share"];

const SUPPLIER_COLUMNS: &[&str] = &["id", "code", "name", "country", "status"];

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let engine = helpers::load_engine(global)?;
    let catalog = helpers::load_catalog(&args.catalog)?;
    let now = helpers::reference_time(args.as_of);
    let filter = build_filter(args.search.as_deref(), &args.facets, &args.ranges);

    match args.kind {
        EntityKind::TestRequest => {
            let items = engine.classify_all(&catalog.test_requests, now);
            show(&items, &filter, TEST_REQUEST_COLUMNS, &args, global, classified_value)
        }
        EntityKind::Inspection => {
            let items = engine.classify_all(&catalog.inspections, now);
            show(&items, &filter, INSPECTION_COLUMNS, &args, global, classified_value)
        }
        EntityKind::Style => {
            let items = engine.classify_all(&catalog.styles, now);
            show(&items, &filter, STYLE_COLUMNS, &args, global, classified_value)
        }
        EntityKind::Component => show(
            &catalog.components,
            &filter,
            COMPONENT_COLUMNS,
            &args,
            global,
            |item| serde_json::to_value(item),
        ),
        EntityKind::Supplier => show(
            &catalog.suppliers,
            &filter,
            SUPPLIER_COLUMNS,
            &args,
            global,
            |item| serde_json::to_value(item),
        ),
    }
}

fn show<T, F>(
    items: &[T],
    filter: &FilterState,
    columns: &[&str],
    args: &ListArgs,
    global: &GlobalOpts,
    to_value: F,
) -> Result<()>
where
    T: Filterable,
    F: Fn(&T) -> serde_json::Result<Value>,
{
    let mut matched = try_apply(items, filter).map_err(EngineError::from)?;
    if let Some(limit) = args.limit {
        matched.truncate(limit);
    }

    if args.count {
        println!("{}", matched.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let values = matched
                .iter()
                .map(|item| to_value(*item))
                .collect::<serde_json::Result<Vec<Value>>>()
                .into_diagnostic()?;
            print_structured(&values, format)?;
        }
        OutputFormat::Id => {
            for item in &matched {
                println!("{}", cell(*item, "id"));
            }
        }
        OutputFormat::Table | OutputFormat::Tsv | OutputFormat::Auto => {
            if matched.is_empty() {
                println!("No {} found.", args.kind.as_str().replace('_', " "));
                return Ok(());
            }
            let mut rows = Rows::new(columns.iter().map(|c| c.replace('_', " ")));
            for item in &matched {
                rows.push(columns.iter().map(|c| cell(*item, c)).collect());
            }
            rows.print(format);
        }
    }
    Ok(())
}

fn cell<T: Filterable + ?Sized>(item: &T, column: &str) -> String {
    match item.field(column) {
        Some(FieldValue::Text(text)) => truncate_str(text, 32),
        Some(FieldValue::Number(n)) => n.to_string(),
        None => "-".to_string(),
    }
}

/// Entity fields plus its live badge
fn classified_value<T: Serialize>(item: &Classified<'_, T>) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(item.entity)?;
    if let Value::Object(map) = &mut value {
        map.insert("sla".to_string(), serde_json::to_value(item.sla)?);
        map.insert("due_in_days".to_string(), serde_json::to_value(item.due_in_days)?);
    }
    Ok(value)
}
