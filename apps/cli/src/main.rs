//! # Beacon CLI
//!
//! Runs a simulated service fleet, the broker it publishes to and the
//! consumer that watches it, all in one process.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config;
mod console;

use clap::Parser;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = beacon_log::init_with(log_config(cli.verbose))?;

    match cli.command {
        Command::Run(args) => commands::run::execute(args).await,
        Command::Config(args) => commands::show_config::execute(&args),
    }
}

/// Logger settings from the environment, with `-v` flags raising the level.
fn log_config(verbose: u8) -> beacon_log::Config {
    let mut config = beacon_log::Config::from_env();
    match verbose {
        0 => {}
        1 => config.level = "debug".to_string(),
        _ => config.level = "trace".to_string(),
    }
    config
}
