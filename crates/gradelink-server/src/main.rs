// ============================================
// File: crates/gradelink-server/src/main.rs
// ============================================
//! # Gradelink Entry Point
//!
//! ## Creation Reason
//! Main entry point for the `gradelink` binary: runs the server, issues
//! client requests, and inspects the local store.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Configuration loading
//! - Logging initialization with tracing
//! - Server execution and client commands
//!
//! ## Usage
//! ```bash
//! gradelink serve                            # Run the server
//! gradelink fetch --id 1000000 --command GMA # One request
//! gradelink interactive                      # Prompt loop
//! gradelink averages                         # Column averages of the local store
//! gradelink validate                         # Check config and store
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Client commands read the same store file as the server; the key that
//!   opens a reply must be present locally
//! - `RUST_LOG` overrides `logging.level`
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gradelink_common::types::StudentId;
use gradelink_core::protocol::Command;
use gradelink_server::services::{averages, RecordStore};
use gradelink_server::{FetchOutcome, GradeClient, Server, ServerConfig};

// ============================================
// CLI Definition
// ============================================

/// Gradelink encrypted grade retrieval
#[derive(Parser, Debug)]
#[command(name = "gradelink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "gradelink.toml")]
        config: PathBuf,
    },

    /// Send one request and print the decrypted reply
    Fetch {
        /// 7-character student ID
        #[arg(short, long)]
        id: String,

        /// Command token: GMA, GL1A, GL2A, GL3A, GL4A, GEA, GG
        #[arg(short = 'C', long)]
        command: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "gradelink.toml")]
        config: PathBuf,
    },

    /// Prompt for requests until end of input
    Interactive {
        /// Path to configuration file
        #[arg(short, long, default_value = "gradelink.toml")]
        config: PathBuf,
    },

    /// Print the column averages of the local store
    Averages {
        /// Path to configuration file
        #[arg(short, long, default_value = "gradelink.toml")]
        config: PathBuf,
    },

    /// Validate configuration file and store
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "gradelink.toml")]
        config: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Self::Serve { config }
            | Self::Fetch { config, .. }
            | Self::Interactive { config }
            | Self::Averages { config }
            | Self::Validate { config } => config,
        }
    }
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration, then start logging at the configured level
    let config = match load_or_default_config(cli.command.config_path()).await {
        Ok(config) => {
            init_logging(&config.logging.level);
            config
        }
        Err(e) => {
            init_logging("info");
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Serve { .. } => cmd_serve(config).await,
        Commands::Fetch { id, command, .. } => cmd_fetch(&config, &id, &command).await,
        Commands::Interactive { .. } => cmd_interactive(&config).await,
        Commands::Averages { .. } => cmd_averages(&config),
        Commands::Validate { config: path } => cmd_validate(&config, &path),
    };

    // Handle errors
    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Runs the server until Ctrl+C.
async fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    let server = Server::new(config);
    server.run().await?;
    Ok(())
}

/// Sends one request.
async fn cmd_fetch(config: &ServerConfig, id: &str, token: &str) -> anyhow::Result<()> {
    let client = GradeClient::new(config);
    fetch_and_print(&client, id, token).await
}

/// Prompts for an ID and a command, one connection per request.
async fn cmd_interactive(config: &ServerConfig) -> anyhow::Result<()> {
    let client = GradeClient::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(id) = prompt(&mut lines, "Please enter ID number: ").await? else {
            break;
        };
        let Some(token) =
            prompt(&mut lines, "Please enter command (GMA, GL1A, GL2A, GL3A, GL4A, GEA, GG): ")
                .await?
        else {
            break;
        };

        // A failed request is reported and the prompt continues.
        if let Err(e) = fetch_and_print(&client, id.trim(), token.trim()).await {
            error!("{:#}", e);
        }
        println!();
    }

    Ok(())
}

/// Prints the nine column averages of the local store.
fn cmd_averages(config: &ServerConfig) -> anyhow::Result<()> {
    let store = RecordStore::from_config(&config.store);
    let averages = averages(&store)?;

    println!("Averages for {}", store.path().display());
    for (column, value) in averages.iter() {
        println!("   {:<10} {}", column.label(), value);
    }
    Ok(())
}

/// Validates configuration and the store it points at.
fn cmd_validate(config: &ServerConfig, path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        println!("✅ Configuration is valid: {}", path.display());
    } else {
        println!("⚠️  Config file not found: {}", path.display());
        println!("   Default values will be used.");
    }
    println!();
    println!("Network:");
    println!("   Listen:      {}", config.network.socket_addr()?);
    println!("   Backlog:     {}", config.network.backlog);
    println!("   Recv buffer: {}", config.network.recv_buffer_size);
    println!();
    println!("Client:");
    println!(
        "   Server:      {}:{}",
        config.client.server_host, config.client.server_port
    );
    match config.client.token_ttl_secs {
        Some(ttl) => println!("   Token TTL:   {ttl}s"),
        None => println!("   Token TTL:   none"),
    }
    println!();

    let store = RecordStore::from_config(&config.store);
    let count = store
        .record_count()
        .with_context(|| format!("store {} is not usable", store.path().display()))?;

    println!("Store:");
    println!("   Path:        {}", store.path().display());
    println!("   Records:     {count}");
    println!("   Cache:       {}", store.is_cached());
    if count == 0 {
        println!("   ⚠️  Store has no records; average requests will fail");
    }
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads the config file if it exists, otherwise the defaults.
async fn load_or_default_config(path: &Path) -> anyhow::Result<ServerConfig> {
    if path.exists() {
        Ok(ServerConfig::load(path).await?)
    } else {
        Ok(ServerConfig::default())
    }
}

/// Runs one request and prints the outcome.
async fn fetch_and_print(client: &GradeClient, id: &str, token: &str) -> anyhow::Result<()> {
    let student_id: StudentId = id
        .parse()
        .with_context(|| format!("'{id}' is not a valid student ID"))?;
    let command = Command::from_token(token);

    info!(%student_id, token, "Sending request");

    match client.fetch_token(&student_id, token).await? {
        FetchOutcome::Reply(payload) => {
            println!("{}: {}", command.describe(), payload);
        }
        FetchOutcome::NoResponse => {
            println!("No response: unknown ID or invalid command");
        }
    }
    Ok(())
}

/// Prints `message` and reads one line. `None` at end of input.
async fn prompt<R>(
    lines: &mut tokio::io::Lines<R>,
    message: &str,
) -> anyhow::Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("{message}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}
