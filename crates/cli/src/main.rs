//! Maison CLI - Database migrations and support tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (orders and session tables)
//! maison-cli migrate
//!
//! # Look up a stored order
//! maison-cli order MSN-3F9A0C12
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "maison-cli")]
#[command(author, version, about = "Maison CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Show a stored order by its number
    Order {
        /// Order number, e.g. MSN-3F9A0C12
        number: String,
    },
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Order { number } => commands::order::show(&number).await?,
    }
    Ok(())
}
