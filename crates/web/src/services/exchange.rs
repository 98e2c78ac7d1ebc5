//! Exchange joining, listing and the dashboard read path.

use sqlx::PgPool;
use thiserror::Error;

use santa_paws_core::{EntryId, ExchangeId, UserId};

use crate::db::exchanges::EXCHANGE_CLOSED;
use crate::db::{ExchangeRepository, ProfileRepository, RepositoryError};
use crate::models::{Corgi, EntrySummary, Exchange, MailingAddress, NewEntry, User};

/// Errors from joining an exchange.
#[derive(Debug, Error)]
pub enum JoinError {
    /// The exchange does not exist.
    #[error("exchange not found")]
    NotFound,

    /// The exchange no longer accepts entries.
    #[error("exchange is closed")]
    Closed,

    /// A corgi is already a Santa in this exchange.
    #[error("already joined: {0}")]
    AlreadyJoined(String),

    /// A Santa is not the caller's corgi.
    #[error("corgi belongs to another owner")]
    NotOwner,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for JoinError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(msg) if msg == EXCHANGE_CLOSED => Self::Closed,
            RepositoryError::Conflict(msg) => Self::AlreadyJoined(msg),
            RepositoryError::NotOwner(_) => Self::NotOwner,
            other => Self::Repository(other),
        }
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub user: User,
    pub address: Option<MailingAddress>,
    pub corgis: Vec<Corgi>,
    pub entries: Vec<EntrySummary>,
}

/// Exchange service.
pub struct ExchangeService<'a> {
    exchanges: ExchangeRepository<'a>,
    profiles: ProfileRepository<'a>,
}

impl<'a> ExchangeService<'a> {
    /// Create a new exchange service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            exchanges: ExchangeRepository::new(pool),
            profiles: ProfileRepository::new(pool),
        }
    }

    /// Open exchanges the user has not joined yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn open_for(&self, user_id: UserId) -> Result<Vec<Exchange>, RepositoryError> {
        self.exchanges.list_open_unjoined(user_id).await
    }

    /// Exchange to show on the join page.
    ///
    /// # Errors
    ///
    /// Returns `JoinError::NotFound` if the exchange does not exist.
    pub async fn get(&self, exchange_id: ExchangeId) -> Result<Exchange, JoinError> {
        self.exchanges
            .get(exchange_id)
            .await?
            .ok_or(JoinError::NotFound)
    }

    /// Register the selected corgis as Santas, all or nothing.
    ///
    /// # Errors
    ///
    /// See [`JoinError`]. No entries are created on error.
    pub async fn join(
        &self,
        user_id: UserId,
        exchange_id: ExchangeId,
        entries: &[NewEntry],
    ) -> Result<Vec<EntryId>, JoinError> {
        Ok(self.exchanges.join(user_id, exchange_id, entries).await?)
    }

    /// Load the dashboard, or `None` if the user has no profile yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any query fails.
    pub async fn dashboard(&self, user_id: UserId) -> Result<Option<Dashboard>, RepositoryError> {
        let Some(user) = self.profiles.get_user(user_id).await? else {
            return Ok(None);
        };

        let (address, corgis, entries) = tokio::try_join!(
            self.profiles.get_address(user_id),
            self.profiles.list_corgis(user_id),
            self.exchanges.entries_for_user(user_id),
        )?;

        Ok(Some(Dashboard {
            user,
            address,
            corgis,
            entries,
        }))
    }
}
