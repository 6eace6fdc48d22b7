//! CLI module for Koble.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Koble - connect users to third-party services and drive agents
///
/// A CLI that binds end users to third-party services through a remote
/// tool-integration platform and runs LLM agents against the resulting
/// remote tools. The name "Koble" comes from the Norwegian word for
/// "connect."
#[derive(Parser, Debug)]
#[command(name = "koble")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve or establish the user's connection to the service
    Connect {
        /// Only report the current state; never start a handshake
        #[arg(long)]
        check: bool,
    },

    /// Create an email draft through the agent
    Draft {
        /// Recipient email address
        to: String,

        /// Draft subject line
        #[arg(short, long, default_value = "Hello from Koble")]
        subject: String,

        /// Draft body text
        #[arg(short, long, default_value = "This draft was created by an AI agent.")]
        body: String,

        /// Free-form task overriding the generated instruction
        #[arg(long, conflicts_with_all = ["subject", "body"])]
        task: Option<String>,
    },

    /// Fetch and list the remote tools available to the user
    Tools {
        /// Tool slugs to fetch (defaults to the configured set)
        #[arg(long, value_delimiter = ',')]
        tools: Option<Vec<String>>,
    },

    /// Check credentials, configuration, and platform reachability
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
