//! # CLI Interface
//!
//! Defines the command-line argument structure for `crest-node` using
//! `clap` derive. Supports three subcommands: `run`, `keygen`, and
//! `version`.

use clap::{Parser, Subcommand};

/// CREST registry node.
///
/// Serves the identity and asset registry over HTTP: clients submit
/// signed transitions and query records by owner, address, or authority.
#[derive(Parser, Debug)]
#[command(
    name = "crest-node",
    about = "CREST registry node",
    version,
    propagate_version = true
)]
pub struct CrestNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the CREST node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the registry node.
    Run(RunArgs),
    /// Generate a fresh Ed25519 keypair and print it.
    Keygen,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the HTTP API.
    #[arg(long, env = "CREST_RPC_PORT", default_value_t = 9741)]
    pub rpc_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "CREST_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
