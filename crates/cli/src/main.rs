//! Shopping list CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sl-cli migrate
//!
//! # List installed Shopify shops
//! sl-cli shops list
//!
//! # Delete every shopping item
//! sl-cli items clear
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `shops list` - List shops with a stored access token
//! - `items clear` - Delete all shopping items

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sl-cli")]
#[command(author, version, about = "Shopping list CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect installed Shopify shops
    Shops {
        #[command(subcommand)]
        action: ShopsAction,
    },
    /// Manage shopping items
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
}

#[derive(Subcommand)]
enum ShopsAction {
    /// List shops with a stored access token
    List,
}

#[derive(Subcommand)]
enum ItemsAction {
    /// Delete every shopping item
    Clear,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Shops { action } => match action {
            ShopsAction::List => commands::shops::list().await?,
        },
        Commands::Items { action } => match action {
            ItemsAction::Clear => commands::items::clear().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_subcommands() {
        let cli = Cli::try_parse_from(["sl-cli", "shops", "list"]).expect("parses");
        assert!(matches!(
            cli.command,
            Commands::Shops {
                action: ShopsAction::List
            }
        ));

        let cli = Cli::try_parse_from(["sl-cli", "items", "clear"]).expect("parses");
        assert!(matches!(
            cli.command,
            Commands::Items {
                action: ItemsAction::Clear
            }
        ));

        assert!(Cli::try_parse_from(["sl-cli", "items"]).is_err());
    }
}
