//! QKart CLI - terminal front-end for the storefront engine.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog
//! qkart products
//!
//! # Search immediately
//! qkart search "running shoes"
//!
//! # Feed keystrokes from stdin through the search debouncer
//! printf 'a\nap\napp\n' | qkart browse
//!
//! # Cart operations (need QKART_TOKEN)
//! qkart cart
//! qkart add BW0jAAeDJmlZCF8i
//! qkart set-qty BW0jAAeDJmlZCF8i 3
//!
//! # Create an account
//! qkart register -u crio.do -p learnbydoing -c learnbydoing
//! ```
//!
//! Configuration is read from the environment; see
//! [`qkart_storefront::config`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use qkart_core::{ProductId, Quantity};
use qkart_storefront::Storefront;
use qkart_storefront::config::ClientConfig;
use qkart_storefront::telemetry;

mod commands;

use commands::{CommandError, Output};

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront client")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the full catalog
    Products,
    /// Search the catalog immediately
    Search {
        /// Search text; empty lists everything
        #[arg(default_value = "")]
        text: String,
    },
    /// Treat each stdin line as the search box contents and show results
    Browse,
    /// Show the cart
    Cart,
    /// Add one unit of a product to the cart
    Add {
        /// Product id
        product_id: String,
    },
    /// Set the quantity of a product in the cart
    SetQty {
        /// Product id
        product_id: String,

        /// New quantity (at least 1)
        #[arg(value_parser = parse_quantity)]
        qty: Quantity,
    },
    /// Register a new account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        confirm_password: String,
    },
}

fn parse_quantity(s: &str) -> Result<Quantity, String> {
    let qty: u32 = s.parse().map_err(|e| format!("{e}"))?;
    Quantity::new(qty).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Keep the guard alive until exit so queued Sentry events are flushed
    let _sentry_guard = telemetry::init(&config);

    let (storefront, mut notifications) = match Storefront::from_config(config) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Failed to start storefront: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli, &storefront).await;
    commands::print_notifications(&mut notifications);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, storefront: &Storefront) -> Result<(), CommandError> {
    let out = Output::new(cli.json);
    match cli.command {
        Commands::Products => commands::catalog::products(storefront, &out).await?,
        Commands::Search { text } => commands::catalog::search(storefront, &out, &text).await?,
        Commands::Browse => commands::catalog::browse(storefront, &out).await?,
        Commands::Cart => commands::cart::show(storefront, &out).await?,
        Commands::Add { product_id } => {
            commands::cart::add(storefront, &out, &ProductId::new(product_id)).await?;
        }
        Commands::SetQty { product_id, qty } => {
            commands::cart::set_qty(storefront, &out, &ProductId::new(product_id), qty).await?;
        }
        Commands::Register {
            username,
            password,
            confirm_password,
        } => {
            commands::account::register(storefront, username, password, confirm_password).await?;
        }
    }
    Ok(())
}
