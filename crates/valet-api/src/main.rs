//! Valet CLI and server entry point.
//!
//! Binary name: `valet`
//!
//! Parses CLI arguments, initializes the database and collaborator
//! clients, then either starts the WebSocket/REST server or runs a
//! one-shot command.

mod http;
mod state;

use clap::{Parser, Subcommand};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use valet_core::chat::ConversationRepository;
use valet_core::memory::MemoryStore;

use state::AppState;

#[derive(Parser)]
#[command(name = "valet", about = "Conversational assistant backend", version)]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket/REST server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1", env = "VALET_HOST")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080, env = "VALET_PORT")]
        port: u16,
        /// Override the configured number of session slots
        #[arg(long, env = "VALET_POOL_SIZE")]
        pool_size: Option<usize>,
    },
    /// Show store and memory-bank statistics
    Status,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,valet=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "valet", &mut std::io::stdout());
        return Ok(());
    }

    let pool_size = match &cli.command {
        Commands::Serve { pool_size, .. } => *pool_size,
        _ => None,
    };
    let state = AppState::init_with(pool_size).await?;

    match cli.command {
        Commands::Serve { host, port, .. } => {
            let router = http::router::build_router(state.clone());
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Valet listening on {} ({} session slots)",
                    console::style("▲").green().bold(),
                    console::style(&addr).cyan(),
                    state.pool.size(),
                );
            }
            tracing::info!(%addr, pool_size = state.pool.size(), "server started");

            axum::serve(listener, router).await?;
        }

        Commands::Status => {
            let stats = state.repository.stats().await?;
            let memories = state.memories.memory_count().await?;

            if cli.json {
                let status = serde_json::json!({
                    "total_turns": stats.total_turns,
                    "unique_sessions": stats.unique_sessions,
                    "memories_stored": memories,
                    "pool_size": state.pool.size(),
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!();
                println!("  {} Valet status", console::style("●").green().bold());
                println!();
                println!("  Turns stored      {}", console::style(stats.total_turns).cyan());
                println!("  Sessions seen     {}", console::style(stats.unique_sessions).cyan());
                println!("  Memories banked   {}", console::style(memories).cyan());
                println!("  Pool size         {}", console::style(state.pool.size()).cyan());
                println!();
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
