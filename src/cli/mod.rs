//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod output;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use filters::EntityKind;

use miette::Result;

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Transitions(args) => commands::transitions::run(args, &global),
        Commands::Sla(args) => commands::sla::run(args, &global),
        Commands::Check(args) => commands::check::run(args, &global),
        Commands::Gate(args) => commands::gate::run(args, &global),
        Commands::List(args) => commands::list::run(args, &global),
        Commands::Amendments(args) => commands::amendments::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
