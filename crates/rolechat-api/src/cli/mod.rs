//! CLI command definitions for the `rolechat` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod role;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Role-play chat backend over Letta agents.
#[derive(Parser)]
#[command(name = "rolechat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file to load instead of `{data_dir}/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log warnings and errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed logs (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (default: `server.port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default: `server.host`).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage roles.
    Roles {
        #[command(subcommand)]
        action: RoleCommand,
    },

    /// Show the stored conversation of a role.
    History {
        /// Role id.
        role_id: String,
    },

    /// Send one message to a role and print the reply as it streams.
    Chat {
        /// Role id.
        role_id: String,

        /// Message text.
        message: String,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum RoleCommand {
    /// List roles, newest first.
    #[command(alias = "ls")]
    List,

    /// Create a role and its upstream agent.
    Create {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Persona memory block.
        #[arg(long, default_value = "")]
        persona: String,

        /// Human memory block.
        #[arg(long, default_value = "")]
        human: String,
    },

    /// Import upstream agents as roles.
    Sync {
        /// Keep local roles whose agent no longer exists upstream.
        #[arg(long)]
        no_prune: bool,
    },
}
