// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "testbed")]
#[command(about = "Disposable container environments for test runs, on Docker or Podman")]
#[command(version)]
pub struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only essential results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Descriptor file (default: discover testbed.yml in the current directory)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new testbed.yml configuration file
    Init {
        /// Environment name
        #[arg(short, long)]
        environment: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Resolve the descriptor and show what would be created
    Plan,

    /// Provision the environment, wait for Ctrl-C, then tear it down
    Up {
        /// Overall provisioning deadline (e.g. 90s, 2m)
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,
    },

    /// Remove resources left behind by crashed runs
    Prune {
        /// Only resources of this environment
        #[arg(short, long)]
        environment: Option<String>,

        /// Minimum age of a resource to remove (e.g. 30m, 2h)
        #[arg(long, default_value = "1h", value_parser = parse_duration)]
        older_than: Duration,
    },
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    let deserializer = serde::de::value::StrDeserializer::<serde::de::value::Error>::new(value);
    humantime_serde::deserialize(deserializer).map_err(|e| e.to_string())
}
