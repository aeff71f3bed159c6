//! Command-line surface.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Simulated service fleet emitting telemetry over a publish/subscribe bus.
#[derive(Debug, Parser)]
#[command(name = "beacon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Host a broker, start the nodes and a consumer, run until Ctrl-C
    Run(RunArgs),

    /// Print the effective configuration as TOML
    Config(ShowConfigArgs),
}

/// Where configuration comes from and the flags layered on top of it.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Configuration file (default: ./beacon.toml when present)
    #[arg(short, long, env = "BEACON_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bootstrap broker address; repeat for several
    #[arg(long = "broker", value_name = "ADDR")]
    pub brokers: Vec<String>,

    /// Run one node for this service; repeat for several
    #[arg(long = "service", value_name = "NAME")]
    pub services: Vec<String>,

    /// Persist log events into the search store at this URL
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// Seed node randomness for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not host an in-process broker
    #[arg(long)]
    pub no_host: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Stop after this long instead of waiting for Ctrl-C (e.g. "30s")
    #[arg(long, value_parser = humantime_serde::re::humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// When to color event lines
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Skip the statistics summary at shutdown
    #[arg(long)]
    pub no_stats: bool,
}

#[derive(Debug, Args)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stdout is a terminal
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}
