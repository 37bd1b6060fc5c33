//! Activities CLI - Catalog seeding and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Load products from a YAML or JSON file
//! activities-cli seed products.yaml
//!
//! # Replace the whole catalog
//! activities-cli seed products.yaml --clear
//!
//! # Count products and orders
//! activities-cli stats
//! ```
//!
//! # Environment Variables
//!
//! - `MONGODB_URI` - MongoDB connection string (required)
//! - `MONGODB_DATABASE` - Database name (default: webstore)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "activities-cli")]
#[command(author, version, about = "After School Activities CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the products collection from a YAML or JSON file
    Seed {
        /// Path to the products file
        file: String,

        /// Delete existing products before inserting
        #[arg(long)]
        clear: bool,
    },
    /// Show product and order counts
    Stats,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { file, clear } => commands::seed::products(&file, clear).await?,
        Commands::Stats => commands::stats::show().await?,
    }
    Ok(())
}
