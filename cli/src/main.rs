//! Main entry point for the opsdesk CLI

use clap::Parser;

mod cli;
mod commands;
mod output;

use cli::Cli;
use commands::execute_command;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    if let Err(e) = execute_command(cli.command, cli.workspace.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
