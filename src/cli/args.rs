//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    amendments::AmendmentsArgs, check::CheckArgs, completions::CompletionsArgs, gate::GateArgs,
    list::ListArgs, sla::SlaArgs, transitions::TransitionsArgs,
};

#[derive(Parser, Debug)]
#[command(name = "tcm")]
#[command(author, version, about = "Textile compliance workflow and validation engine")]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    tcm transitions test-request in_review
    tcm sla catalog/ --as-of 2024-05-10
    tcm list test-request catalog/ --facet status=testing,on_hold --facet sla=overdue
    tcm gate catalog/ STY-1")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Configuration file (default: .tcm/config.yaml, then user config)
    #[arg(long, global = true, env = "TCM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table for lists, YAML for single records
    #[default]
    Auto,
    /// Bordered table
    Table,
    /// Tab-separated values
    Tsv,
    Yaml,
    Json,
    /// IDs only, one per line
    Id,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show legal next states for a workflow state
    Transitions(TransitionsArgs),

    /// Live SLA badges for tracked entities
    Sla(SlaArgs),

    /// Validate components and styles before submission
    Check(CheckArgs),

    /// Stage gate and Gold Seal Workbook report for styles
    Gate(GateArgs),

    /// List and filter entities
    List(ListArgs),

    /// Show test request amendment chains
    Amendments(AmendmentsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
