use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "synth",
    version,
    about = "Synthesize the CI trust policy and deployment pipeline declarations"
)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "SYNTH_CONFIG", default_value = "synth.toml")]
    pub config: PathBuf,

    /// Log line format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the subject matchers of the CI role's trust policy
    Subjects {
        /// Print a JSON array instead of one matcher per line
        #[arg(long)]
        json: bool,
    },

    /// Print the CI role's trust-policy document
    Policy,

    /// Synthesize every stack into a manifest
    Manifest {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Omit run metadata so identical declarations give identical bytes
        #[arg(long)]
        deterministic: bool,
    },
}
