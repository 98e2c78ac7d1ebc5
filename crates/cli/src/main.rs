//! Secret Santa Paws CLI - Database migrations and exchange management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! paws-cli migrate
//!
//! # Create an exchange (open by default)
//! paws-cli exchange create --title "Holiday Pawty" --year 2026 --due-date 2026-12-15
//!
//! # Open or close an exchange
//! paws-cli exchange close 3f0c8a52-...
//!
//! # List every exchange
//! paws-cli exchange list
//! ```
//!
//! # Environment Variables
//!
//! - `PAWS_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use santa_paws_core::ExchangeId;

mod commands;

#[derive(Parser)]
#[command(name = "paws-cli")]
#[command(author, version, about = "Secret Santa Paws CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage gift exchanges
    Exchange {
        #[command(subcommand)]
        action: ExchangeAction,
    },
}

#[derive(Subcommand)]
enum ExchangeAction {
    /// Create a new exchange
    Create {
        /// Exchange title, e.g. "Holiday Pawty"
        #[arg(short, long)]
        title: String,

        /// Exchange year
        #[arg(short, long)]
        year: i32,

        /// Ship-by date (YYYY-MM-DD)
        #[arg(short, long)]
        due_date: NaiveDate,

        /// Create the exchange closed to new entries
        #[arg(long)]
        closed: bool,
    },
    /// Open an exchange to new entries
    Open {
        /// Exchange ID
        id: ExchangeId,
    },
    /// Close an exchange to new entries
    Close {
        /// Exchange ID
        id: ExchangeId,
    },
    /// List every exchange
    List,
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
        Commands::Exchange { action } => match action {
            ExchangeAction::Create {
                title,
                year,
                due_date,
                closed,
            } => {
                commands::exchange::create(&title, year, due_date, !closed).await?;
            }
            ExchangeAction::Open { id } => commands::exchange::set_open(id, true).await?,
            ExchangeAction::Close { id } => commands::exchange::set_open(id, false).await?,
            ExchangeAction::List => commands::exchange::list().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_exchange_create() {
        let cli = Cli::try_parse_from([
            "paws-cli",
            "exchange",
            "create",
            "--title",
            "Holiday Pawty",
            "--year",
            "2026",
            "--due-date",
            "2026-12-15",
            "--closed",
        ]);

        let Ok(Cli {
            command:
                Commands::Exchange {
                    action:
                        ExchangeAction::Create {
                            title,
                            year,
                            due_date,
                            closed,
                        },
                },
        }) = cli
        else {
            panic!("expected exchange create");
        };
        assert_eq!(title, "Holiday Pawty");
        assert_eq!(year, 2026);
        assert_eq!(due_date, NaiveDate::from_ymd_opt(2026, 12, 15).unwrap_or_default());
        assert!(closed);
    }

    #[test]
    fn test_rejects_bad_exchange_id() {
        assert!(Cli::try_parse_from(["paws-cli", "exchange", "close", "nope"]).is_err());
    }
}
