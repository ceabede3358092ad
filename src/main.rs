//! Scoped Gmail MCP Server
//!
//! A Model Context Protocol (MCP) server for Gmail whose tools are gated by
//! the OAuth2 scopes granted to the process.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use gmail_scoped_mcp::config::Config;
use gmail_scoped_mcp::error::Result;
use gmail_scoped_mcp::gmail::client::GmailClient;
use gmail_scoped_mcp::mcp::dispatch::Dispatcher;
use gmail_scoped_mcp::mcp::registry::Registry;
use gmail_scoped_mcp::mcp::server::McpServer;
use gmail_scoped_mcp::scopes;

/// Scoped Gmail MCP Server
#[derive(Parser)]
#[command(name = "gmail-scoped-mcp")]
#[command(author, version, about = "Gmail MCP server with scope-gated tools")]
struct Cli {
    /// Scopes granted to this process, as short names or URLs
    /// (defaults to gmail.modify and gmail.settings.basic)
    #[arg(long, value_name = "LIST")]
    scopes: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the known scope vocabulary
    Scopes,

    /// Validate a scope list without starting the server
    Check {
        /// Scope names, comma or whitespace separated
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP transport; log to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scopes) => {
            for name in scopes::known_names() {
                println!("{:<24} {}", name, scopes::to_url(name));
            }
            Ok(())
        }
        Some(Commands::Check { input }) => {
            let names = scopes::parse(&input);
            let report = scopes::validate(&names);

            if report.valid {
                println!("All {} scope name(s) are known.", names.len());
                Ok(())
            } else {
                eprintln!("Unknown scope names: {}", report.invalid.join(", "));
                eprintln!("Known names: {}", scopes::known_names().join(", "));
                std::process::exit(1);
            }
        }
        None => {
            let config = Config::new(cli.scopes.as_deref())?;
            run_server(config).await
        }
    }
}

async fn run_server(config: Config) -> Result<()> {
    let report = scopes::validate(&config.granted_scopes);
    for unknown in &report.invalid {
        // Unknown scopes never match anything; the tools they were meant
        // to unlock will be rejected
        if scopes::to_name(unknown) == unknown.as_str() {
            tracing::warn!("granted scope '{}' is not in the catalogue", unknown);
        }
    }

    let access_token = match config.access_token() {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "starting with granted scopes: {}",
        config.granted_scopes.join(", ")
    );

    let client = Arc::new(GmailClient::new(access_token));
    let dispatcher = Dispatcher::new(Registry::new()?, config.granted_scopes, client);

    let mut server = McpServer::new(dispatcher);
    server.run_stdio().await
}
