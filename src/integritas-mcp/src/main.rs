//! Integritas MCP server - blockchain timestamping tools over MCP.
//!
//! This binary exposes the Integritas timestamping API as MCP tools,
//! served over stdio (for MCP clients) or HTTP.

mod dispatcher;
mod http;
mod logging;
mod stdio;
mod tools;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use integritas_core::secrets::ApiKeyStore;
use integritas_core::Settings;

use crate::http::HttpState;
use crate::tools::ToolContext;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Integritas MCP Server - stamp and verify data on the Minima blockchain.
#[derive(Parser)]
#[command(name = "integritas-mcp")]
#[command(version = VERSION)]
#[command(about = "MCP server for the Integritas blockchain timestamping API")]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (newline-delimited JSON-RPC)
    Stdio,

    /// Serve MCP over HTTP
    Http {
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Listen port
        #[arg(long, default_value = "8787")]
        port: u16,
    },

    /// Manage the stored Integritas API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show server configuration and version
    Info,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save an API key to the OS keyring
    Set {
        /// The API key value
        api_key: String,
    },
    /// Report where the API key currently resolves from
    Show,
    /// Remove the API key from the OS keyring
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings = Settings::from_env();

    match cli.command {
        Commands::Stdio => {
            let ctx = ToolContext::new(settings).context("building upstream client")?;
            stdio::serve(ctx).await
        }
        Commands::Http { host, port } => {
            let bearer_token = settings.http_bearer_token.clone();
            let ctx = ToolContext::new(settings).context("building upstream client")?;
            let state = HttpState {
                ctx: Arc::new(ctx),
                bearer_token,
            };
            let listener = http::bind_listener(&host, port)
                .await
                .context("binding listener")?;
            http::serve(listener, state, shutdown_signal())
                .await
                .context("serving http")
        }
        Commands::Key { action } => run_key_action(action, &settings),
        Commands::Info => {
            println!("integritas-mcp {VERSION}");
            println!("  upstream:    {}", settings.api_base);
            println!(
                "  health url:  {}",
                settings.health_url.as_deref().unwrap_or("(not set)")
            );
            println!("  poll rounds: {}", settings.status_rounds);
            println!(
                "  poll delay:  {}s",
                settings.status_poll_interval.as_secs()
            );
            let keys = ApiKeyStore::new();
            println!("  api key:     {}", keys.describe(&settings));
            Ok(())
        }
    }
}

fn run_key_action(action: KeyAction, settings: &Settings) -> anyhow::Result<()> {
    let keys = ApiKeyStore::new();
    match action {
        KeyAction::Set { api_key } => {
            anyhow::ensure!(!api_key.trim().is_empty(), "API key must not be empty");
            keys.save_keyring(&api_key).context("saving to keyring")?;
            println!("API key saved to the OS keyring.");
        }
        KeyAction::Show => {
            println!("API key source: {}", keys.describe(settings));
        }
        KeyAction::Clear => {
            keys.clear_keyring().context("clearing keyring")?;
            println!("API key removed from the OS keyring.");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    // Ignore signal registration failures and fall back to pending.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
