//! nativepack CLI - package vcpkg ports as multi-platform NuGet packages

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use miette::{GraphicalReportHandler, GraphicalTheme};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use nativepack::core::PlatformError;
use nativepack::graph::GraphError;
use nativepack::util::diagnostic;
use nativepack::util::shell::{ColorChoice, Shell};
use nativepack::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color.into());

    init_logging(&cli);

    if let Err(e) = run(cli, &shell) {
        report(&e, shell.use_color());
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("nativepack=debug")
        } else if cli.quiet {
            EnvFilter::new("nativepack=error")
        } else {
            EnvFilter::new("nativepack=info")
        }
    });

    let ansi = match ColorChoice::from(cli.color) {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    if let Some(root) = cli.root {
        ctx = ctx.with_project_root(root);
    }
    ctx.set_verbose(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &ctx, shell),
        Commands::List => commands::list::execute(shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Render a failed run: graph errors as diagnostics, platform errors
/// through miette, anything else with its context chain.
fn report(err: &anyhow::Error, color: bool) {
    if let Some(graph_err) = err.downcast_ref::<GraphError>() {
        diagnostic::emit(&graph_err.to_diagnostic(), color);
        return;
    }

    if let Some(platform_err) = err.downcast_ref::<PlatformError>() {
        let theme = if color {
            GraphicalTheme::unicode()
        } else {
            GraphicalTheme::unicode_nocolor()
        };
        let mut rendered = String::new();
        if GraphicalReportHandler::new_themed(theme)
            .render_report(&mut rendered, platform_err)
            .is_ok()
        {
            eprint!("{}", rendered);
            return;
        }
    }

    eprintln!("error: {:#}", err);
}
