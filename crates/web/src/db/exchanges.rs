//! Exchange and entry repository.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::instrument;

use santa_paws_core::{CorgiId, EntryId, ExchangeId, UserId};

use super::RepositoryError;
use crate::models::{EntrySummary, Exchange, NewEntry};

/// `Conflict` message for joins into a closed exchange.
pub const EXCHANGE_CLOSED: &str = "exchange is closed";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ExchangeRow {
    id: ExchangeId,
    title: String,
    year: i32,
    due_date: NaiveDate,
    is_open: bool,
}

impl From<ExchangeRow> for Exchange {
    fn from(row: ExchangeRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            year: row.year,
            due_date: row.due_date,
            is_open: row.is_open,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntrySummaryRow {
    id: EntryId,
    exchange_id: ExchangeId,
    exchange_title: String,
    exchange_year: i32,
    due_date: NaiveDate,
    santa_id: CorgiId,
    santa_name: String,
    notes: Option<String>,
    recipient_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<EntrySummaryRow> for EntrySummary {
    fn from(row: EntrySummaryRow) -> Self {
        Self {
            id: row.id,
            exchange_id: row.exchange_id,
            exchange_title: row.exchange_title,
            exchange_year: row.exchange_year,
            due_date: row.due_date,
            santa_id: row.santa_id,
            santa_name: row.santa_name,
            notes: row.notes,
            recipient_name: row.recipient_name,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for exchange and entry database operations.
pub struct ExchangeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExchangeRepository<'a> {
    /// Create a new exchange repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an exchange by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ExchangeId) -> Result<Option<Exchange>, RepositoryError> {
        let row = sqlx::query_as::<_, ExchangeRow>(
            r"
            SELECT id, title, year, due_date, is_open
            FROM paws.exchange
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Exchange::from))
    }

    /// List every exchange, newest year first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Exchange>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExchangeRow>(
            r"
            SELECT id, title, year, due_date, is_open
            FROM paws.exchange
            ORDER BY year DESC, due_date ASC, title ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Exchange::from).collect())
    }

    /// List open exchanges in which none of the user's corgis is a Santa yet.
    ///
    /// Ordered by due date, then title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_open_unjoined(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Exchange>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExchangeRow>(
            r"
            SELECT x.id, x.title, x.year, x.due_date, x.is_open
            FROM paws.exchange x
            WHERE x.is_open
              AND NOT EXISTS (
                  SELECT 1
                  FROM paws.entry e
                  JOIN paws.corgi c ON c.id = e.santa_id
                  WHERE e.exchange_id = x.id AND c.owner_id = $1
              )
            ORDER BY x.due_date ASC, x.title ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Exchange::from).collect())
    }

    /// List the user's entries with exchange and corgi names, newest exchange first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn entries_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<EntrySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, EntrySummaryRow>(
            r"
            SELECT e.id,
                   e.exchange_id,
                   x.title AS exchange_title,
                   x.year AS exchange_year,
                   x.due_date,
                   e.santa_id,
                   s.name AS santa_name,
                   e.notes,
                   r.name AS recipient_name,
                   e.created_at
            FROM paws.entry e
            JOIN paws.exchange x ON x.id = e.exchange_id
            JOIN paws.corgi s ON s.id = e.santa_id
            LEFT JOIN paws.corgi r ON r.id = e.recipient_id
            WHERE s.owner_id = $1
            ORDER BY x.due_date DESC, s.name ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(EntrySummary::from).collect())
    }

    /// Register the user's corgis as Santas in one transaction.
    ///
    /// Either every entry is created or none is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the exchange does not exist.
    /// Returns `RepositoryError::Conflict` if the exchange is closed or a corgi
    /// already has an entry in it.
    /// Returns `RepositoryError::NotOwner` if a Santa is not the user's corgi.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, entries), fields(user_id = %user_id, exchange_id = %exchange_id, entries = entries.len()))]
    pub async fn join(
        &self,
        user_id: UserId,
        exchange_id: ExchangeId,
        entries: &[NewEntry],
    ) -> Result<Vec<EntryId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let is_open: Option<bool> = sqlx::query_scalar(
            r"
            SELECT is_open
            FROM paws.exchange
            WHERE id = $1
            FOR SHARE
            ",
        )
        .bind(exchange_id)
        .fetch_optional(&mut *tx)
        .await?;

        match is_open {
            None => return Err(RepositoryError::NotFound),
            Some(false) => {
                return Err(RepositoryError::Conflict(EXCHANGE_CLOSED.to_owned()));
            }
            Some(true) => {}
        }

        let santa_ids: BTreeSet<CorgiId> = entries.iter().map(|e| e.santa_id).collect();
        let santa_list: Vec<CorgiId> = santa_ids.iter().copied().collect();
        let owned: i64 = sqlx::query_scalar(
            r"
            SELECT count(*)
            FROM paws.corgi
            WHERE owner_id = $1 AND id = ANY($2)
            ",
        )
        .bind(user_id)
        .bind(&santa_list)
        .fetch_one(&mut *tx)
        .await?;

        if usize::try_from(owned).ok() != Some(santa_ids.len()) {
            return Err(RepositoryError::NotOwner("santa corgi".to_owned()));
        }

        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = EntryId::new_random();
            sqlx::query(
                r"
                INSERT INTO paws.entry (id, santa_id, exchange_id, notes)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(id)
            .bind(entry.santa_id)
            .bind(exchange_id)
            .bind(entry.notes.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "entry"))?;
            created.push(id);
        }

        tx.commit().await?;

        tracing::info!(created = created.len(), "Joined exchange");
        Ok(created)
    }

    /// Create an exchange.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        title: &str,
        year: i32,
        due_date: NaiveDate,
        is_open: bool,
    ) -> Result<Exchange, RepositoryError> {
        let row = sqlx::query_as::<_, ExchangeRow>(
            r"
            INSERT INTO paws.exchange (id, title, year, due_date, is_open)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, year, due_date, is_open
            ",
        )
        .bind(ExchangeId::new_random())
        .bind(title)
        .bind(year)
        .bind(due_date)
        .bind(is_open)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Open or close an exchange for new entries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the exchange doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_open(&self, id: ExchangeId, is_open: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE paws.exchange
            SET is_open = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(is_open)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
