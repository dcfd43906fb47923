// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # CREST Registry Node
//!
//! Entry point for the `crest-node` binary. Parses CLI arguments,
//! initializes logging, and serves the registry HTTP API.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the registry node
//! - `keygen`  — generate a fresh Ed25519 keypair
//! - `version` — print build version information

mod api;
mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use cli::{Commands, CrestNodeCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CrestNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen => {
            keygen();
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the registry node and serves the HTTP API until shutdown.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "crest_node=info,crest_registry=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(rpc_port = args.rpc_port, "starting crest-node");

    let app_state = api::AppState::new(env!("CARGO_PKG_VERSION").to_string());
    let router = api::create_router(app_state);

    let addr = format!("0.0.0.0:{}", args.rpc_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", addr))?;
    tracing::info!("API server listening on {}", addr);

    tokio::select! {
        res = axum::serve(listener, router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("crest-node stopped");
    Ok(())
}

/// Generates an Ed25519 keypair and prints it to stdout.
///
/// The secret key is printed in the clear — pipe it somewhere safe.
fn keygen() {
    let keypair = crest_registry::Keypair::generate();
    println!("public key  : {}", keypair.public_key().to_hex());
    println!("secret key  : {}", hex::encode(keypair.secret_key_bytes()));
    println!(
        "identity at : {}",
        crest_registry::Address::identity(&keypair.public_key())
            .map(|a| a.to_bech32())
            .unwrap_or_else(|e| format!("<derivation failed: {}>", e))
    );
}

/// Prints version information to stdout.
fn print_version() {
    println!("crest-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
