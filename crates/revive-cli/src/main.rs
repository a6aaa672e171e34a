//! revive CLI - audit and rewrite old blog posts
//!
//! This is the main entry point for the revive command-line interface.
//! Command implementations live in [`commands`]; errors are mapped onto
//! semantic exit codes by [`error`].

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

mod cli;
mod commands;
mod error;
mod output;
mod utils;

use cli::{Cli, Commands};
use error::{CliError, exit_code_from_error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = utils::logging::initialize_logging(&cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        return ExitCode::from(1);
    }

    match execute_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}

async fn execute_command(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sitemap { domain, format } => commands::sitemap(&config, &domain, format).await,
        Commands::Fetch { url, format } => commands::fetch(&config, &url, format).await,
        Commands::Run(args) => commands::run(&config, args, cli.quiet).await,
    }
}

fn report_error(err: &anyhow::Error) {
    // A CliError displays as its source, so print the source chain once
    let chain = err
        .downcast_ref::<CliError>()
        .map_or_else(|| format!("{err:#}"), |cli_err| format!("{:#}", cli_err.source));
    eprintln!("{} {chain}", "error:".red().bold());
}
