//! # CLI
//!
//! This module defines the command-line interface of `lfgweb` using `clap`.
//!
//! Connection flags are global and override the values stored in the config file.
use clap::{Args, Parser, Subcommand};
use lfg_service::pb::KillProofId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lfgweb", version, about = "Looking-For-Group client over gRPC-Web")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// The server URL (e.g. http://localhost:8080)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Bearer token sent with every call
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Unary call deadline in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Use HTTP/2 instead of HTTP/1.1
    #[arg(long, global = true)]
    pub http2: bool,

    /// Path to the config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage groups
    Groups {
        #[command(subcommand)]
        sub: GroupCommands,
    },

    /// Manage applications to a group
    Applications {
        #[command(subcommand)]
        sub: ApplicationCommands,
    },

    /// Inspect or edit the stored configuration
    Config {
        #[command(subcommand)]
        sub: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List all open groups
    List,
    /// Create a new group
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// lfgweb groups create "Raid Night" --kill-proof li --min 250
    /// ```
    Create {
        title: String,
        /// Minimum amount of kill proofs required to apply
        #[arg(long, default_value_t = 0)]
        min: u32,
        /// Kind of kill proof required (li, ld, uce, ufe, boneskinner)
        #[arg(long, value_parser = parse_kill_proof, default_value = "unknown")]
        kill_proof: KillProofId,
    },
    /// Change the title or requirements of a group
    Update {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = 0)]
        min: u32,
        #[arg(long, value_parser = parse_kill_proof, default_value = "unknown")]
        kill_proof: KillProofId,
    },
    /// Delete a group
    Delete { id: String },
    /// Print group changes as they happen, until interrupted
    Watch,
}

#[derive(Subcommand)]
pub enum ApplicationCommands {
    /// List the applications to a group
    List { group_id: String },
    /// Apply to a group
    Apply {
        group_id: String,
        /// Account name shown to the group creator
        #[arg(long)]
        account: String,
    },
    /// Withdraw an application
    Delete { id: String },
    /// Print application changes of a group as they happen, until interrupted
    Watch { group_id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the stored configuration
    Show,
    /// Store the server URL
    SetUrl { url: String },
    /// Store the bearer token
    SetToken { token: String },
}

fn parse_kill_proof(value: &str) -> Result<KillProofId, String> {
    KillProofId::from_str_name(value).ok_or_else(|| {
        format!("Unknown kill proof '{value}'. Expected one of: li, ld, uce, ufe, boneskinner")
    })
}
