//! Exchange management commands.
//!
//! Exchanges are created and opened/closed here; the site only lists and
//! joins them.

use chrono::NaiveDate;

use santa_paws_core::ExchangeId;
use santa_paws_web::db::ExchangeRepository;
use santa_paws_web::models::Exchange;

use super::{CommandError, connect};

/// Create an exchange.
///
/// # Errors
///
/// Returns `CommandError` if the insert fails.
pub async fn create(
    title: &str,
    year: i32,
    due_date: NaiveDate,
    is_open: bool,
) -> Result<ExchangeId, CommandError> {
    let pool = connect().await?;

    let exchange = ExchangeRepository::new(&pool)
        .create(title, year, due_date, is_open)
        .await?;

    tracing::info!(
        "Exchange created! ID: {}, Title: {} {}, Ship by: {}, Open: {}",
        exchange.id,
        exchange.title,
        exchange.year,
        exchange.due_date,
        exchange.is_open
    );

    pool.close().await;
    Ok(exchange.id)
}

/// Open or close an exchange to new entries.
///
/// # Errors
///
/// Returns `CommandError::Repository` if the exchange does not exist.
pub async fn set_open(id: ExchangeId, is_open: bool) -> Result<(), CommandError> {
    let pool = connect().await?;

    ExchangeRepository::new(&pool).set_open(id, is_open).await?;
    tracing::info!(
        "Exchange {} is now {}",
        id,
        if is_open { "open" } else { "closed" }
    );

    pool.close().await;
    Ok(())
}

/// Print every exchange, newest year first.
///
/// # Errors
///
/// Returns `CommandError` if the query fails.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let exchanges = ExchangeRepository::new(&pool).list_all().await?;
    pool.close().await;

    #[allow(clippy::print_stdout)]
    {
        if exchanges.is_empty() {
            println!("No exchanges yet.");
        }
        for exchange in &exchanges {
            println!("{}", format_row(exchange));
        }
    }
    Ok(())
}

fn format_row(exchange: &Exchange) -> String {
    format!(
        "{}  {:<6}  {}  {} {}",
        exchange.id,
        if exchange.is_open { "open" } else { "closed" },
        exchange.due_date,
        exchange.title,
        exchange.year
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row() {
        let exchange = Exchange {
            id: ExchangeId::new_random(),
            title: "Holiday Pawty".to_string(),
            year: 2026,
            due_date: NaiveDate::from_ymd_opt(2026, 12, 15).unwrap_or_default(),
            is_open: false,
        };

        let row = format_row(&exchange);
        assert!(row.starts_with(&exchange.id.to_string()));
        assert!(row.contains("closed  2026-12-15  Holiday Pawty 2026"));
    }
}
