//! nestkit CLI - builds the PyNEST extension against an installed NEST

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nestkit::util::diagnostic::{self, emit, suggestions, Diagnostic, QueryError, ToolError};
use nestkit::util::Shell;

mod cli;
mod commands;

use cli::{split_package_args, Cli, Commands};

fn main() {
    let (argv, forwarded) = split_package_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    let color = !cli.no_color && diagnostic::stderr_color();

    match run(cli, forwarded) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            report(&e, color);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli, forwarded: Option<Vec<String>>) -> Result<i32> {
    let filter = if cli.verbose {
        EnvFilter::new("nestkit=debug")
    } else {
        EnvFilter::new("nestkit=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .without_time()
        .init();

    let shell = Shell::from_flags(cli.verbose, cli.no_color);
    let global = commands::Global {
        provider: cli.provider,
        verbose: cli.verbose,
        color: !cli.no_color,
    };

    match cli.command {
        Commands::Query(args) => commands::query::execute(args, &global).map(|_| 0),
        Commands::Plan(args) => commands::plan::execute(args, &global).map(|_| 0),
        Commands::Build(args) => commands::build::execute(args, &global, &shell).map(|_| 0),
        Commands::Package(mut args) => {
            if let Some(raw) = forwarded {
                args.args = raw;
            }
            commands::package::execute(args, &global, &shell)
        }
        Commands::Doctor(args) => commands::doctor::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args).map(|_| 0),
    }
}

/// Print an error, with help text for the failures users can act on.
fn report(err: &anyhow::Error, color: bool) {
    eprintln!("error: {:#}", err);

    if let Some(QueryError::Failed { .. }) = err.downcast_ref::<QueryError>() {
        emit(
            &Diagnostic::note("the configuration provider rejected the query")
                .with_suggestion(suggestions::PROVIDER_OVERRIDE),
            color,
        );
    } else if let Some(tool) = err.downcast_ref::<ToolError>() {
        match tool {
            ToolError::Missing {
                hint: Some(hint), ..
            } => emit(&Diagnostic::note(hint.clone()), color),
            ToolError::Failed { .. } => emit(
                &Diagnostic::note("an external build tool failed")
                    .with_suggestion(suggestions::RUN_VERBOSE),
                color,
            ),
            _ => {}
        }
    }
}
