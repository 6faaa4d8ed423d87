//! Lending CLI - Main entry point

use clap::{Parser, Subcommand};
use lending_cli::{commands, context, AppContext};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lendctl")]
#[command(about = "Operator tooling for the lending protocol", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Configuration file (defaults to $LENDING_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key
    Keygen {
        /// Output file path
        #[arg(long, default_value = "lending.key")]
        output: PathBuf,
    },

    /// Print the address of $LENDING_KEY
    Whoami,

    /// Show one owner's position
    Status {
        /// Owner address (hex)
        owner: String,
    },

    /// List positions
    Positions {
        /// Only positions eligible for liquidation
        #[arg(long)]
        liquidatable: bool,
    },

    /// Verify the journal hash chain
    Audit,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Keygen and audit must work without a readable journal
    let open = || -> anyhow::Result<AppContext> {
        let config = context::load_config(cli.config.as_deref())?;
        AppContext::new(&cli.data, config)
    };

    match cli.command {
        Commands::Keygen { output } => commands::keygen(&output)?,
        Commands::Audit => commands::audit(&AppContext::journal_dir(&cli.data))?,
        Commands::Whoami => commands::whoami(&open()?)?,
        Commands::Status { owner } => commands::status(&open()?, &owner).await?,
        Commands::Positions { liquidatable } => commands::positions(&open()?, liquidatable).await?,
        Commands::Config => commands::config(&open()?)?,
    }

    Ok(())
}
