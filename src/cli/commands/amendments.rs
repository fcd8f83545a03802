//! `tcm amendments` command - Test request amendment chains

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{effective_format, print_structured};
use crate::cli::{helpers, GlobalOpts, OutputFormat};
use crate::core::amendment::AmendmentIndex;
use crate::core::EngineError;
use crate::entities::test_request::TestRequest;

#[derive(clap::Args, Debug)]
pub struct AmendmentsArgs {
    /// Catalog file or directory
    pub catalog: PathBuf,

    /// Show the chain leading to one request
    #[arg(long)]
    pub chain: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChainEntry<'a> {
    id: &'a str,
    number: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    amendments: Vec<ChainEntry<'a>>,
}

pub fn run(args: AmendmentsArgs, global: &GlobalOpts) -> Result<()> {
    let catalog = helpers::load_catalog(&args.catalog)?;
    let index = AmendmentIndex::build(&catalog.test_requests).map_err(EngineError::from)?;
    let format = effective_format(global.format, args.chain.is_none());

    if let Some(id) = &args.chain {
        let chain = index.chain(id).map_err(EngineError::from)?;
        match format {
            OutputFormat::Json | OutputFormat::Yaml => {
                let entries: Vec<ChainEntry> = chain.iter().map(|r| entry(*r, None)).collect();
                print_structured(&entries, format)?;
            }
            _ => {
                for (depth, request) in chain.iter().enumerate() {
                    println!("{}{}", "  ".repeat(depth), line(request));
                }
            }
        }
        return Ok(());
    }

    let roots: Vec<&TestRequest> = index.roots().collect();
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let trees: Vec<ChainEntry> = roots
                .iter()
                .filter(|r| !index.amendments_of(&r.id).is_empty())
                .map(|r| entry(*r, Some(&index)))
                .collect();
            print_structured(&trees, format)?;
        }
        OutputFormat::Id => {
            for request in catalog.test_requests.iter().filter(|r| r.is_amendment) {
                println!("{}", request.id);
            }
        }
        OutputFormat::Table | OutputFormat::Tsv | OutputFormat::Auto => {
            let mut any = false;
            for root in roots.iter().filter(|r| !index.amendments_of(&r.id).is_empty()) {
                any = true;
                print_tree(&index, root, 0);
            }
            if !any {
                println!("No amendments found.");
            }
            for (parent, amendments) in index.shared_parents() {
                println!(
                    "{} {} is amended by {} requests",
                    style("note:").yellow().bold(),
                    parent.id,
                    amendments.len()
                );
            }
        }
    }
    Ok(())
}

fn line(request: &TestRequest) -> String {
    format!(
        "{} {} [{}]",
        style(&request.id).cyan(),
        request.number,
        request.status
    )
}

fn print_tree(index: &AmendmentIndex<'_>, request: &TestRequest, depth: usize) {
    let marker = if depth == 0 { "" } else { "└─ " };
    println!("{}{}{}", "   ".repeat(depth.saturating_sub(1)), marker, line(request));
    for amendment in index.amendments_of(&request.id) {
        print_tree(index, amendment, depth + 1);
    }
}

fn entry<'a>(request: &'a TestRequest, index: Option<&AmendmentIndex<'a>>) -> ChainEntry<'a> {
    ChainEntry {
        id: &request.id,
        number: &request.number,
        status: request.status.as_str(),
        amendments: index
            .map(|idx| {
                idx.amendments_of(&request.id)
                    .iter()
                    .map(|a| entry(*a, Some(idx)))
                    .collect()
            })
            .unwrap_or_default(),
    }
}
