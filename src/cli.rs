//! Command-line interface, clap-based.

use clap::{Parser, Subcommand};

/// BountyBoard — job marketplace coordinator with x402 payment settlement.
#[derive(Debug, Parser)]
#[command(name = "bountyboard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settlement network to use for this session.
    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Enable verbose output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Walk a job through the full lifecycle against an in-memory store.
    Demo,

    /// Parse free-form post text into a job-creation request.
    Parse {
        /// The post text, e.g. "design me a logo $25 #design".
        text: String,

        /// Handle of the poster.
        #[arg(long, default_value = "@anon")]
        poster: String,
    },

    /// Print the encoded payment challenge for a reward.
    Challenge {
        /// Reward string, e.g. "25 USDT".
        reward: String,
    },
}
