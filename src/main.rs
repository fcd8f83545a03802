use clap::Parser;
use miette::Result;
use tcm::cli::{Cli, GlobalOpts};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Install miette's fancy error handler for source-annotated diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(&cli.global);

    tcm::cli::run(cli)
}

/// Log to stderr: `TCM_LOG` wins, then `-v`/`--quiet`, else warnings only
fn init_tracing(global: &GlobalOpts) {
    let default = if global.quiet {
        "off"
    } else {
        match global.verbose {
            0 => "warn",
            1 => "tcm=debug,info",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_env("TCM_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
