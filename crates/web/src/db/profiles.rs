//! Profile repository: users, mailing addresses and corgis.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::instrument;

use santa_paws_core::{CorgiId, Email, UsState, UserId};

use super::RepositoryError;
use crate::models::{Corgi, CurrentIdentity, MailingAddress, ProfileInput, User};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MailingAddressRow {
    address1: String,
    address2: Option<String>,
    city: String,
    state: String,
    zip: String,
    phone: String,
}

impl TryFrom<MailingAddressRow> for MailingAddress {
    type Error = RepositoryError;

    fn try_from(row: MailingAddressRow) -> Result<Self, Self::Error> {
        let state = UsState::parse(&row.state)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid state: {e}")))?;

        Ok(Self {
            address1: row.address1,
            address2: row.address2,
            city: row.city,
            state,
            zip: row.zip,
            phone: row.phone,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CorgiRow {
    id: CorgiId,
    owner_id: UserId,
    name: String,
    birth_date: Option<NaiveDate>,
    image_uri: String,
}

impl From<CorgiRow> for Corgi {
    fn from(row: CorgiRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            birth_date: row.birth_date,
            image_uri: row.image_uri,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the exchange profile for a user, if one has been saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, first_name, last_name, created_at, updated_at
            FROM paws."user"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user's mailing address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored state is unknown.
    pub async fn get_address(
        &self,
        user_id: UserId,
    ) -> Result<Option<MailingAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, MailingAddressRow>(
            r"
            SELECT address1, address2, city, state, zip, phone
            FROM paws.mailing_address
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(MailingAddress::try_from).transpose()
    }

    /// List a user's corgis, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_corgis(&self, owner_id: UserId) -> Result<Vec<Corgi>, RepositoryError> {
        let rows = sqlx::query_as::<_, CorgiRow>(
            r"
            SELECT id, owner_id, name, birth_date, image_uri
            FROM paws.corgi
            WHERE owner_id = $1
            ORDER BY created_at ASC, name ASC
            ",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Corgi::from).collect())
    }

    /// Save a complete profile in one transaction.
    ///
    /// Upserts the user and mailing address, deletes the owner's corgis that are
    /// no longer listed, then upserts every listed corgi. Corgis without an id
    /// get a fresh one. Returns the ids of the saved corgis in input order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotOwner` if a listed corgi id belongs to
    /// another user. Nothing is written in that case.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, identity, input), fields(user_id = %identity.id, corgis = input.corgis.len()))]
    pub async fn save_profile(
        &self,
        identity: &CurrentIdentity,
        input: &ProfileInput,
    ) -> Result<Vec<CorgiId>, RepositoryError> {
        let user_id = identity.id;
        let ids: Vec<CorgiId> = input
            .corgis
            .iter()
            .map(|c| c.id.unwrap_or_else(CorgiId::new_random))
            .collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO paws."user" (id, email, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(identity.email.as_str())
        .bind(identity.profile_first_name())
        .bind(identity.profile_last_name())
        .execute(&mut *tx)
        .await?;

        let address = &input.address;
        sqlx::query(
            r"
            INSERT INTO paws.mailing_address (user_id, address1, address2, city, state, zip, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE
            SET address1 = EXCLUDED.address1,
                address2 = EXCLUDED.address2,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                zip = EXCLUDED.zip,
                phone = EXCLUDED.phone,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(&address.address1)
        .bind(address.address2.as_deref())
        .bind(&address.city)
        .bind(address.state.code())
        .bind(&address.zip)
        .bind(&address.phone)
        .execute(&mut *tx)
        .await?;

        let removed = sqlx::query(
            r"
            DELETE FROM paws.corgi
            WHERE owner_id = $1 AND NOT (id = ANY($2))
            ",
        )
        .bind(user_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        for (id, corgi) in ids.iter().zip(&input.corgis) {
            // The WHERE clause turns an update of someone else's corgi into a no-op.
            let result = sqlx::query(
                r"
                INSERT INTO paws.corgi (id, owner_id, name, birth_date, image_uri)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    birth_date = EXCLUDED.birth_date,
                    image_uri = EXCLUDED.image_uri,
                    updated_at = now()
                WHERE paws.corgi.owner_id = EXCLUDED.owner_id
                ",
            )
            .bind(id)
            .bind(user_id)
            .bind(&corgi.name)
            .bind(corgi.birth_date)
            .bind(&corgi.image_uri)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::warn!(corgi_id = %id, "Profile save referenced another owner's corgi");
                return Err(RepositoryError::NotOwner(format!("corgi {id}")));
            }
        }

        tx.commit().await?;

        tracing::info!(removed, saved = ids.len(), "Profile saved");
        Ok(ids)
    }
}
