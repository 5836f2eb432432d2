//! Emporium CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! emp-cli migrate
//!
//! # Replace all data with the demo catalog and accounts
//! emp-cli seed
//!
//! # Add demo data without clearing existing rows
//! emp-cli seed --keep-existing
//!
//! # Create an admin account
//! emp-cli admin create -e admin@example.com -n "Admin Name" -p "s3cret-pass"
//! ```
//!
//! All commands read `EMPORIUM_DATABASE_URL` (or `DATABASE_URL`) from the
//! environment or `.env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emp-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load demo users and products
    Seed {
        /// Keep existing rows instead of clearing users, products and orders
        #[arg(long)]
        keep_existing: bool,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Initial password (at least 6 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { keep_existing } => commands::seed::run(keep_existing).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
        },
    }
    Ok(())
}
