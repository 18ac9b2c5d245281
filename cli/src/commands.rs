//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_domain::OutputFormat;

/// CLI arguments for tally
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, about = "Consensus verification for crowdsourced transcription")]
#[command(long_about = r#"
Tally cross-checks redundant answers to the same transcription task and
only accepts a value once independent workers agree on it.

Configuration files are loaded from (in priority order):
1. TALLY_<SECTION>__<KEY>            Environment
2. --config <path>                   Explicit config file
3. ./tally.toml                      Project-level config
4. ~/.config/tally/config.toml       Global config

Example:
  tally unpack 'rows[0][amount]=12' 'rows[1][amount]=7' 'tags[]=a' 'tags[]=b'
  tally verify batch.json --output json
  tally config
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Unpack bracketed form fields into a nested JSON value
    Unpack {
        /// Fields as KEY=VALUE; repeat a key for multiple values
        #[arg(value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Record and verify a batch of task submissions
    Verify {
        /// Batch file (JSON)
        #[arg(value_name = "BATCH")]
        batch: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show configuration sources, effective values and issues
    Config,
}
