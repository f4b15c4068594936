//! `notes` command-line entry point.
//!
//! # Responsibility
//! - Load `.env`, parse arguments and dispatch to command handlers.
//! - Map any failure, usage errors included, to `Error: <message>` on
//!   stderr and exit status 1. `--help` and `--version` exit 0.

mod args;
mod commands;
mod errors;
mod output;

use args::Cli;
use clap::Parser;
use errors::CliError;

fn main() {
    dotenv::dotenv().ok();

    let result = match Cli::try_parse() {
        Ok(cli) => commands::run(cli),
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => Err(CliError::from(err)),
    };

    if let Err(err) = result {
        log::error!("event=cli_exit module=cli status=error error={err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
