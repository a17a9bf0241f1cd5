//! Stagehand CLI - incremental file and database deployment
//!
//! Usage: stagehand [OPTIONS] <CONFIG>
//!
//! Exit code 0 when every component succeeded, 1 otherwise.

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod logging;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match commands::deploy::cmd_deploy(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
